//! Hierarchical configuration tree
//!
//! The HAL configuration file is a tree of named nodes:
//!
//! ```text
//! # comment
//! route {
//!     exclusive-criterion-type {
//!         ModeType "Normal,RingTone,InCall,InCommunication"
//!     }
//!     criterion {
//!         AndroidMode {
//!             type ModeType
//!             default Normal
//!         }
//!     }
//! }
//! ```
//!
//! A node is either a block (`name { ... }`) or a leaf (`name value...`).
//! Leaf values run to the end of the line; several words are joined by a
//! single space. Double quoted words keep their spaces and support `\"`, `\\`
//! and `\n` escapes.

use crate::error::{PlatformStateError, Result};

/// One node of the configuration tree
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfNode {
    pub name: String,
    pub value: String,
    pub children: Vec<ConfNode>,
    /// Line the node starts on, 0 for the root
    pub line: usize,
}

impl ConfNode {
    /// Parse a whole configuration file into an unnamed root node
    ///
    /// # Errors
    /// Returns `PlatformStateError::ConfSyntax` with the position of the first error
    pub fn parse(text: &str) -> Result<Self> {
        let tokens = tokenize(text)?;
        let mut parser = Parser { tokens, pos: 0 };
        let children = parser.block(false)?;
        Ok(Self {
            children,
            ..Self::default()
        })
    }

    /// First direct child with the given name
    pub fn find(&self, name: &str) -> Option<&ConfNode> {
        self.children.iter().find(|child| child.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum TokenKind {
    Text(String),
    Open,
    Close,
    Newline,
    Eof,
}

#[derive(Debug, Clone)]
struct Token {
    kind: TokenKind,
    line: usize,
    column: usize,
}

fn syntax_error(line: usize, column: usize, message: impl Into<String>) -> PlatformStateError {
    PlatformStateError::ConfSyntax {
        line,
        column,
        message: message.into(),
    }
}

fn tokenize(text: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();
    let (mut line, mut column) = (1, 1);

    while let Some(c) = chars.peek().copied() {
        let (start_line, start_column) = (line, column);
        match c {
            '\n' => {
                chars.next();
                tokens.push(Token {
                    kind: TokenKind::Newline,
                    line,
                    column,
                });
                line += 1;
                column = 1;
            }
            c if c.is_whitespace() => {
                chars.next();
                column += 1;
            }
            '#' => {
                while let Some(c) = chars.peek().copied() {
                    if c == '\n' {
                        break;
                    }
                    chars.next();
                    column += 1;
                }
            }
            '{' | '}' => {
                chars.next();
                column += 1;
                tokens.push(Token {
                    kind: if c == '{' {
                        TokenKind::Open
                    } else {
                        TokenKind::Close
                    },
                    line: start_line,
                    column: start_column,
                });
            }
            '"' => {
                chars.next();
                column += 1;
                let mut word = String::new();
                loop {
                    match chars.next() {
                        None | Some('\n') => {
                            return Err(syntax_error(
                                start_line,
                                start_column,
                                "unterminated quoted string",
                            ))
                        }
                        Some('"') => {
                            column += 1;
                            break;
                        }
                        Some('\\') => {
                            column += 2;
                            match chars.next() {
                                Some('n') => word.push('\n'),
                                Some(escaped) if escaped != '\n' => word.push(escaped),
                                _ => {
                                    return Err(syntax_error(line, column, "dangling escape"))
                                }
                            }
                        }
                        Some(other) => {
                            column += 1;
                            word.push(other);
                        }
                    }
                }
                tokens.push(Token {
                    kind: TokenKind::Text(word),
                    line: start_line,
                    column: start_column,
                });
            }
            _ => {
                let mut word = String::new();
                while let Some(c) = chars.peek().copied() {
                    if c.is_whitespace() || matches!(c, '{' | '}' | '#' | '"') {
                        break;
                    }
                    word.push(c);
                    chars.next();
                    column += 1;
                }
                tokens.push(Token {
                    kind: TokenKind::Text(word),
                    line: start_line,
                    column: start_column,
                });
            }
        }
    }
    tokens.push(Token {
        kind: TokenKind::Eof,
        line,
        column,
    });
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        // The token stream always ends with Eof, which is never consumed.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    fn block(&mut self, nested: bool) -> Result<Vec<ConfNode>> {
        let mut nodes = Vec::new();
        loop {
            let token = self.advance();
            match token.kind {
                TokenKind::Newline => {}
                TokenKind::Eof if nested => {
                    return Err(syntax_error(token.line, token.column, "missing '}'"));
                }
                TokenKind::Eof => return Ok(nodes),
                TokenKind::Close if nested => return Ok(nodes),
                TokenKind::Close => {
                    return Err(syntax_error(token.line, token.column, "unexpected '}'"));
                }
                TokenKind::Open => {
                    return Err(syntax_error(
                        token.line,
                        token.column,
                        "block without a name",
                    ));
                }
                TokenKind::Text(name) => nodes.push(self.node(name, token.line)?),
            }
        }
    }

    fn node(&mut self, name: String, line: usize) -> Result<ConfNode> {
        let mut words: Vec<String> = Vec::new();
        loop {
            let token = self.peek().clone();
            match token.kind {
                TokenKind::Text(word) => {
                    self.advance();
                    words.push(word);
                }
                TokenKind::Open if words.is_empty() => {
                    self.advance();
                    let children = self.block(true)?;
                    return Ok(ConfNode {
                        name,
                        value: String::new(),
                        children,
                        line,
                    });
                }
                TokenKind::Open => {
                    return Err(syntax_error(
                        token.line,
                        token.column,
                        format!("node {} has both a value and a block", name),
                    ));
                }
                TokenKind::Newline | TokenKind::Close | TokenKind::Eof => {
                    return Ok(ConfNode {
                        name,
                        value: words.join(" "),
                        children: Vec::new(),
                        line,
                    });
                }
            }
        }
    }
}
