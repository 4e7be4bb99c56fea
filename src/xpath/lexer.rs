//! Tokenizer for selector expressions.

use super::SelectorError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Slash,
    DoubleSlash,
    Dot,
    DotDot,
    At,
    Comma,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Pipe,
    Star,
    DoubleColon,
    Eq,
    Neq,
    Lt,
    Le,
    Gt,
    Ge,
    Name(String),
    Literal(String),
    Number(f64),
}

impl Token {
    pub(crate) fn describe(&self) -> String {
        match self {
            Self::Name(name) => format!("name '{name}'"),
            Self::Literal(text) => format!("string '{text}'"),
            Self::Number(n) => format!("number {n}"),
            other => format!("'{}'", other.symbol()),
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            Self::Slash => "/",
            Self::DoubleSlash => "//",
            Self::Dot => ".",
            Self::DotDot => "..",
            Self::At => "@",
            Self::Comma => ",",
            Self::LParen => "(",
            Self::RParen => ")",
            Self::LBracket => "[",
            Self::RBracket => "]",
            Self::Pipe => "|",
            Self::Star => "*",
            Self::DoubleColon => "::",
            Self::Eq => "=",
            Self::Neq => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Name(_) | Self::Literal(_) | Self::Number(_) => "",
        }
    }
}

/// A token and the char offset it starts at.
pub(crate) type Spanned = (Token, usize);

fn is_name_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_'
}

fn is_name_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '-'
}

pub(crate) fn tokenize(source: &str) -> Result<Vec<Spanned>, SelectorError> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        let next = chars.get(i + 1).copied();
        let start = i;

        let token = match ch {
            c if c.is_whitespace() => {
                i += 1;
                continue;
            }
            '/' if next == Some('/') => {
                i += 2;
                Token::DoubleSlash
            }
            '/' => {
                i += 1;
                Token::Slash
            }
            '.' if next == Some('.') => {
                i += 2;
                Token::DotDot
            }
            '.' if next.is_some_and(|c| c.is_ascii_digit()) => {
                let (number, end) = read_number(&chars, i);
                i = end;
                Token::Number(number)
            }
            '.' => {
                i += 1;
                Token::Dot
            }
            ':' if next == Some(':') => {
                i += 2;
                Token::DoubleColon
            }
            '!' if next == Some('=') => {
                i += 2;
                Token::Neq
            }
            '<' if next == Some('=') => {
                i += 2;
                Token::Le
            }
            '>' if next == Some('=') => {
                i += 2;
                Token::Ge
            }
            '@' | ',' | '(' | ')' | '[' | ']' | '|' | '*' | '=' | '<' | '>' => {
                i += 1;
                match ch {
                    '@' => Token::At,
                    ',' => Token::Comma,
                    '(' => Token::LParen,
                    ')' => Token::RParen,
                    '[' => Token::LBracket,
                    ']' => Token::RBracket,
                    '|' => Token::Pipe,
                    '*' => Token::Star,
                    '=' => Token::Eq,
                    '<' => Token::Lt,
                    _ => Token::Gt,
                }
            }
            quote @ ('\'' | '"') => {
                let Some(len) = chars[i + 1..].iter().position(|&c| c == quote) else {
                    return Err(SelectorError::UnterminatedLiteral { position: start });
                };
                let text: String = chars[i + 1..i + 1 + len].iter().collect();
                i += len + 2;
                Token::Literal(text)
            }
            c if c.is_ascii_digit() => {
                let (number, end) = read_number(&chars, i);
                i = end;
                Token::Number(number)
            }
            c if is_name_start(c) => {
                let len = chars[i..].iter().take_while(|&&c| is_name_char(c)).count();
                let name: String = chars[i..i + len].iter().collect();
                i += len;
                Token::Name(name)
            }
            other => {
                return Err(SelectorError::UnexpectedChar {
                    ch: other,
                    position: start,
                })
            }
        };

        tokens.push((token, start));
    }

    Ok(tokens)
}

fn read_number(chars: &[char], start: usize) -> (f64, usize) {
    let mut end = start;
    let mut seen_dot = false;
    while let Some(&c) = chars.get(end) {
        if c.is_ascii_digit() {
            end += 1;
        } else if c == '.' && !seen_dot && chars.get(end + 1).is_some_and(char::is_ascii_digit) {
            seen_dot = true;
            end += 1;
        } else {
            break;
        }
    }
    let text: String = chars[start..end].iter().collect();
    (text.parse().unwrap_or(f64::NAN), end)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        tokenize(source).unwrap().into_iter().map(|(t, _)| t).collect()
    }

    #[test]
    fn test_path_tokens() {
        assert_eq!(
            kinds(".//a/@href"),
            vec![
                Token::Dot,
                Token::DoubleSlash,
                Token::Name("a".into()),
                Token::Slash,
                Token::At,
                Token::Name("href".into()),
            ]
        );
    }

    #[test]
    fn test_hyphenated_names_and_axes() {
        assert_eq!(
            kinds("following-sibling::data-x"),
            vec![
                Token::Name("following-sibling".into()),
                Token::DoubleColon,
                Token::Name("data-x".into()),
            ]
        );
    }

    #[test]
    fn test_predicate_tokens() {
        assert_eq!(
            kinds("[@class != \"a b\"][2]"),
            vec![
                Token::LBracket,
                Token::At,
                Token::Name("class".into()),
                Token::Neq,
                Token::Literal("a b".into()),
                Token::RBracket,
                Token::LBracket,
                Token::Number(2.0),
                Token::RBracket,
            ]
        );
    }

    #[test]
    fn test_czech_names_are_names() {
        assert_eq!(kinds("událost"), vec![Token::Name("událost".into())]);
    }

    #[test]
    fn test_unterminated_literal() {
        let err = tokenize("//a[@id='x]").unwrap_err();
        assert!(matches!(err, SelectorError::UnterminatedLiteral { position: 8 }));
    }

    #[test]
    fn test_unexpected_char() {
        let err = tokenize("//a#b").unwrap_err();
        assert!(matches!(err, SelectorError::UnexpectedChar { ch: '#', position: 3 }));
    }
}
