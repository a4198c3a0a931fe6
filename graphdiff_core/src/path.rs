use graphdiff_common::{GraphDiffError, Result};
use std::fmt;

/// Path of the member `name` under `parent`
pub fn child_path(parent: &str, name: &str) -> String {
    format!("{}.{}", parent, name)
}

/// Path of element `index` of the collection at `parent`
pub fn indexed_path(parent: &str, index: usize) -> String {
    format!("{}[{}]", parent, index)
}

/// Programmatic builder for dotted member paths
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyPath {
    segments: Vec<String>,
}

impl PropertyPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn member(mut self, name: impl Into<String>) -> Self {
        self.segments.push(name.into());
        self
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn build(&self) -> String {
        self.segments
            .iter()
            .fold(String::new(), |path, segment| child_path(&path, segment))
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.build())
    }
}

/// A member selector translated into a dotted path.
///
/// Accepts closure-like selectors over a member chain, with nested
/// projections into collection elements:
///
/// ```text
/// x => x.Author.Name                               .Author.Name
/// |x| x.children.iter().map(|c| c.name)            .children.name
/// x => x.Children.Select(y => y.BasicChild.Id)     .Children.BasicChild.Id
/// Author.Name                                      .Author.Name
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Selector {
    path: String,
}

impl Selector {
    pub fn parse(expression: &str) -> Result<Self> {
        let tokens = tokenize(expression)?;
        let mut parser = Parser {
            expression,
            tokens,
            pos: 0,
        };
        let segments = parser.parse_selector()?;
        Ok(Self {
            path: format!(".{}", segments.join(".")),
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn into_path(self) -> String {
        self.path
    }
}

impl AsRef<str> for Selector {
    fn as_ref(&self) -> &str {
        &self.path
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

/// Parse a selector written as Rust tokens: `selector!(x => x.Author.Name)`
#[macro_export]
macro_rules! selector {
    ($($tokens:tt)+) => {
        $crate::path::Selector::parse(stringify!($($tokens)+))
    };
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Ident(String),
    Dot,
    Arrow,
    Pipe,
    LParen,
    RParen,
}

fn tokenize(expression: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = expression.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '.' => {
                chars.next();
                tokens.push(Token::Dot);
            }
            '|' => {
                chars.next();
                tokens.push(Token::Pipe);
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            '=' => {
                chars.next();
                if chars.next() != Some('>') {
                    return Err(unsupported(expression));
                }
                tokens.push(Token::Arrow);
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut ident = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_alphanumeric() || c == '_' {
                        ident.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Ident(ident));
            }
            _ => return Err(unsupported(expression)),
        }
    }

    Ok(tokens)
}

fn unsupported(expression: &str) -> GraphDiffError {
    GraphDiffError::UnsupportedExpression(expression.trim().to_string())
}

struct Parser<'a> {
    expression: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser<'_> {
    fn parse_selector(&mut self) -> Result<Vec<String>> {
        let is_lambda = self.tokens.first() == Some(&Token::Pipe)
            || self.tokens.contains(&Token::Arrow);
        let segments = if is_lambda {
            self.parse_lambda()?
        } else {
            self.parse_chain()?
        };

        if self.pos != self.tokens.len() {
            return Err(self.error());
        }
        Ok(segments)
    }

    /// `A.B.C` or `.A.B.C`
    fn parse_chain(&mut self) -> Result<Vec<String>> {
        if self.peek() == Some(&Token::Dot) {
            self.pos += 1;
        }
        let mut segments = vec![self.ident()?];
        while self.eat(&Token::Dot) {
            segments.push(self.ident()?);
        }
        Ok(segments)
    }

    /// `x => body` or `|x| body`
    fn parse_lambda(&mut self) -> Result<Vec<String>> {
        let param = if self.eat(&Token::Pipe) {
            let param = self.ident()?;
            self.expect(&Token::Pipe)?;
            param
        } else {
            let param = self.ident()?;
            self.expect(&Token::Arrow)?;
            param
        };
        self.parse_body(&param)
    }

    fn parse_body(&mut self, param: &str) -> Result<Vec<String>> {
        if self.ident()? != param {
            return Err(self.error());
        }

        let mut segments = Vec::new();
        while self.eat(&Token::Dot) {
            let name = self.ident()?;
            if self.peek() != Some(&Token::LParen) {
                segments.push(name);
                continue;
            }

            // a projection ends the chain
            match name.as_str() {
                "Select" => {
                    self.expect(&Token::LParen)?;
                    segments.extend(self.parse_lambda()?);
                    self.expect(&Token::RParen)?;
                }
                "iter" | "into_iter" => {
                    self.expect(&Token::LParen)?;
                    self.expect(&Token::RParen)?;
                    self.expect(&Token::Dot)?;
                    if self.ident()? != "map" {
                        return Err(self.error());
                    }
                    self.expect(&Token::LParen)?;
                    segments.extend(self.parse_lambda()?);
                    self.expect(&Token::RParen)?;
                }
                _ => return Err(self.error()),
            }
            break;
        }

        if segments.is_empty() {
            return Err(self.error());
        }
        Ok(segments)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token) -> Result<()> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.error())
        }
    }

    fn ident(&mut self) -> Result<String> {
        match self.tokens.get(self.pos) {
            Some(Token::Ident(name)) => {
                self.pos += 1;
                Ok(name.clone())
            }
            _ => Err(self.error()),
        }
    }

    fn error(&self) -> GraphDiffError {
        unsupported(self.expression)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(expression: &str) -> String {
        Selector::parse(expression).unwrap().into_path()
    }

    #[test]
    fn test_simple_member_chain() {
        assert_eq!(path("x => x.Name"), ".Name");
        assert_eq!(path("x => x.Author.Address.City"), ".Author.Address.City");
        assert_eq!(path("|b| b.author.name"), ".author.name");
        assert_eq!(path("Author.Name"), ".Author.Name");
        assert_eq!(path(".Author.Name"), ".Author.Name");
    }

    #[test]
    fn test_projection_into_children() {
        assert_eq!(
            path("x => x.Children.Select(y => y.BasicChild.BasicChildId)"),
            ".Children.BasicChild.BasicChildId"
        );
        assert_eq!(
            path("x => x.BasicChild.Children.Select(y => y.Children.Select(z => z.BasicChildName))"),
            ".BasicChild.Children.Children.BasicChildName"
        );
        assert_eq!(
            path("|x| x.children.iter().map(|c| c.name)"),
            ".children.name"
        );
    }

    #[test]
    fn test_rejects_unsupported_shapes() {
        for expression in [
            "",
            "x => x",
            "x => y.Name",
            "x => x.Name.ToUpper()",
            "x => x.Items[0]",
            "x => x.A + x.B",
            "x => x.Children.Select(y => y.Name).First",
            "|x| x.items.iter().filter(|i| i.ok)",
            "x = x.Name",
        ] {
            assert!(
                matches!(
                    Selector::parse(expression),
                    Err(GraphDiffError::UnsupportedExpression(_))
                ),
                "accepted {:?}",
                expression
            );
        }
    }

    #[test]
    fn test_selector_macro() {
        let selector = crate::selector!(x => x.Author.Name).unwrap();
        assert_eq!(selector.path(), ".Author.Name");
        let projected = crate::selector!(|x| x.tags.iter().map(|t| t.label)).unwrap();
        assert_eq!(projected.to_string(), ".tags.label");
    }

    #[test]
    fn test_property_path_builder() {
        let path = PropertyPath::root().member("Author").member("Address");
        assert_eq!(path.build(), ".Author.Address");
        assert!(PropertyPath::root().is_root());
        assert_eq!(PropertyPath::root().build(), "");
        assert_eq!(indexed_path(".Children", 2), ".Children[2]");
    }
}
