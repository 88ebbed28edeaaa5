//! The `ReadUserToken()` collaborator.

use std::collections::VecDeque;
use std::future::Future;

use crate::error::InputError;

/// A message and destination as the user entered them.
///
/// The destination is kept raw so the ring can decide how to treat values
/// that are not positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserToken {
    pub message: String,
    pub destination: i64,
}

impl UserToken {
    pub fn new(message: impl Into<String>, destination: i64) -> Self {
        Self {
            message: message.into(),
            destination,
        }
    }
}

/// Supplies messages to the origin.
///
/// `Ok(None)` means the source is exhausted (end of input).
pub trait TokenSource: Send + 'static {
    fn read_user_token(
        &mut self,
    ) -> impl Future<Output = Result<Option<UserToken>, InputError>> + Send;
}

/// A fixed list of messages, handed out in order.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    queue: VecDeque<UserToken>,
}

impl ScriptedSource {
    pub fn new(tokens: impl IntoIterator<Item = UserToken>) -> Self {
        Self {
            queue: tokens.into_iter().collect(),
        }
    }

    /// A source with a single message.
    pub fn once(message: impl Into<String>, destination: i64) -> Self {
        Self::new([UserToken::new(message, destination)])
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

impl TokenSource for ScriptedSource {
    async fn read_user_token(&mut self) -> Result<Option<UserToken>, InputError> {
        Ok(self.queue.pop_front())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_source_in_order_then_exhausted() {
        let mut source = ScriptedSource::new([UserToken::new("a", 1), UserToken::new("b", 2)]);
        assert_eq!(source.remaining(), 2);
        assert_eq!(source.read_user_token().await.unwrap(), Some(UserToken::new("a", 1)));
        assert_eq!(source.read_user_token().await.unwrap(), Some(UserToken::new("b", 2)));
        assert_eq!(source.read_user_token().await.unwrap(), None);
    }
}
