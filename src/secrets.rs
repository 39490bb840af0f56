use std::{borrow::Cow, fmt};

use crate::{ConfigError, ConfigResult};

pub trait SecretsProvider {
    fn get_consumer_key_pair<'a>(&'a self) -> (&'a str, &'a str);

    fn get_token_pair<'a>(&'a self) -> (&'a str, &'a str);
}

/// OAuth 1.0a user-context credentials.
///
/// Built once per process and only ever read afterwards.
#[derive(Clone)]
pub struct Credentials<'a> {
    consumer_key: Cow<'a, str>,
    consumer_secret: Cow<'a, str>,
    access_token: Cow<'a, str>,
    access_token_secret: Cow<'a, str>,
}

impl<'a> Credentials<'a> {
    pub fn new<TKey, TSecret>(consumer_key: TKey, consumer_secret: TSecret) -> ConsumerCredentials<'a>
    where
        TKey: Into<Cow<'a, str>>,
        TSecret: Into<Cow<'a, str>>,
    {
        ConsumerCredentials {
            consumer_key: consumer_key.into(),
            consumer_secret: consumer_secret.into(),
        }
    }

    /// Rejects credentials with an empty field.
    pub fn validate(self) -> ConfigResult<Self> {
        let fields = [
            ("consumer_key", &self.consumer_key),
            ("consumer_secret", &self.consumer_secret),
            ("access_token", &self.access_token),
            ("access_token_secret", &self.access_token_secret),
        ];
        for &(name, value) in fields.iter() {
            if value.trim().is_empty() {
                return Err(ConfigError::EmptyCredential(name));
            }
        }
        Ok(self)
    }
}

/// First half of [`Credentials`]; add the access token pair with [`ConsumerCredentials::token`].
#[derive(Debug, Clone)]
pub struct ConsumerCredentials<'a> {
    consumer_key: Cow<'a, str>,
    consumer_secret: Cow<'a, str>,
}

impl<'a> ConsumerCredentials<'a> {
    pub fn token<TKey, TSecret>(self, token: TKey, token_secret: TSecret) -> Credentials<'a>
    where
        TKey: Into<Cow<'a, str>>,
        TSecret: Into<Cow<'a, str>>,
    {
        Credentials {
            consumer_key: self.consumer_key,
            consumer_secret: self.consumer_secret,
            access_token: token.into(),
            access_token_secret: token_secret.into(),
        }
    }
}

impl SecretsProvider for Credentials<'_> {
    fn get_consumer_key_pair<'a>(&'a self) -> (&'a str, &'a str) {
        (&self.consumer_key, &self.consumer_secret)
    }

    fn get_token_pair<'a>(&'a self) -> (&'a str, &'a str) {
        (&self.access_token, &self.access_token_secret)
    }
}

// secrets stay out of logs
impl fmt::Debug for Credentials<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"<redacted>")
            .field("access_token", &self.access_token)
            .field("access_token_secret", &"<redacted>")
            .finish()
    }
}
