use std::sync::atomic::{AtomicUsize, Ordering};

pub struct Token(String);

impl From<&str> for Token {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl Token {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<redacted>")
    }
}

/// Round-robin set of API tokens.
///
/// The ring is owned by whoever builds the client and is passed in
/// explicitly, so independent clients never share a cursor.
#[derive(Debug, Default)]
pub struct TokenRing {
    tokens: Vec<Token>,
    cursor: AtomicUsize,
}

impl TokenRing {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            cursor: AtomicUsize::new(0),
        }
    }

    /// Build a ring from a comma-separated list, ignoring blank entries.
    pub fn from_list(raw: &str) -> Self {
        let tokens = raw
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(Token::from)
            .collect();

        Self::new(tokens)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Hand out the next token and advance the cursor.
    pub fn next_token(&self) -> Option<&Token> {
        if self.tokens.is_empty() {
            return None;
        }

        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % self.tokens.len();
        self.tokens.get(index)
    }
}
