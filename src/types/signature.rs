// Grammar for canonical Move type signatures:
//
//   type    := path generics?
//   path    := (address "::")? ident ("::" ident)*
//   generics:= "<" type ("," type)* ">"
//   address := "0x" hexdigit+
//
// Whitespace between tokens is ignored.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ParseError;
use crate::types::type_tag::{addresses_equal, TypeTag};

const MAX_DEPTH: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Address(String),
    Ident(String),
    PathSep,
    Open,
    Close,
    Comma,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Address(a) => format!("address '{}'", a),
            Token::Ident(i) => format!("identifier '{}'", i),
            Token::PathSep => "'::'".to_string(),
            Token::Open => "'<'".to_string(),
            Token::Close => "'>'".to_string(),
            Token::Comma => "','".to_string(),
        }
    }
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn tokenize(input: &str) -> Result<Vec<(usize, Token)>, ParseError> {
    let bytes = input.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b if b.is_ascii_whitespace() => i += 1,
            b'<' => {
                tokens.push((i, Token::Open));
                i += 1;
            }
            b'>' => {
                tokens.push((i, Token::Close));
                i += 1;
            }
            b',' => {
                tokens.push((i, Token::Comma));
                i += 1;
            }
            b':' => {
                if bytes.get(i + 1) != Some(&b':') {
                    return Err(ParseError::Unexpected {
                        offset: i,
                        expected: "'::'",
                        found: "':'".to_string(),
                    });
                }
                tokens.push((i, Token::PathSep));
                i += 2;
            }
            b'0' if matches!(bytes.get(i + 1), Some(b'x') | Some(b'X')) => {
                let start = i;
                i += 2;
                while i < bytes.len() && bytes[i].is_ascii_hexdigit() {
                    i += 1;
                }
                let digits = i - start - 2;
                if digits == 0 || (i < bytes.len() && is_ident_byte(bytes[i])) {
                    while i < bytes.len() && is_ident_byte(bytes[i]) {
                        i += 1;
                    }
                    return Err(ParseError::InvalidAddress(input[start..i].to_string()));
                }
                tokens.push((start, Token::Address(input[start..i].to_string())));
            }
            b if b.is_ascii_alphabetic() || b == b'_' => {
                let start = i;
                while i < bytes.len() && is_ident_byte(bytes[i]) {
                    i += 1;
                }
                tokens.push((start, Token::Ident(input[start..i].to_string())));
            }
            _ => {
                let found = input[i..].chars().next().unwrap_or_default();
                return Err(ParseError::Unexpected {
                    offset: i,
                    expected: "a type token",
                    found: format!("'{}'", found),
                });
            }
        }
    }

    Ok(tokens)
}

/// A parsed type expression such as `0x1::m::Outer<0x2::a::A, 0x3::b::B>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeExpr {
    pub address: Option<String>,
    pub path: Vec<String>,
    pub params: Vec<TypeExpr>,
}

impl TypeExpr {
    /// The type without its parameters
    pub fn base(&self) -> String {
        let path = self.path.join("::");
        match &self.address {
            Some(address) => format!("{}::{}", address, path),
            None => path,
        }
    }

    /// True when this names `<address>::<module>::<name>`, with or without parameters
    pub fn is_struct(&self, address: &str, module: &str, name: &str) -> bool {
        match &self.address {
            Some(own) => {
                addresses_equal(own, address)
                    && self.path.len() == 2
                    && self.path[0] == module
                    && self.path[1] == name
            }
            None => false,
        }
    }

    /// Structural equality with addresses compared after normalization
    pub fn same_type(&self, other: &TypeExpr) -> bool {
        let addresses_match = match (&self.address, &other.address) {
            (Some(a), Some(b)) => addresses_equal(a, b),
            (None, None) => true,
            _ => false,
        };
        addresses_match
            && self.path == other.path
            && self.params.len() == other.params.len()
            && self
                .params
                .iter()
                .zip(&other.params)
                .all(|(a, b)| a.same_type(b))
    }

    pub fn into_type_tag(self) -> Result<TypeTag, ParseError> {
        if !self.params.is_empty() {
            return Err(ParseError::NestedGeneric(self.to_string()));
        }
        if let (Some(address), [module, name]) = (&self.address, self.path.as_slice()) {
            return Ok(TypeTag::new(address.clone(), module.clone(), name.clone()));
        }
        Err(ParseError::InvalidTypeTag(self.to_string()))
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base())?;
        if !self.params.is_empty() {
            write!(f, "<")?;
            for (i, param) in self.params.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", param)?;
            }
            write!(f, ">")?;
        }
        Ok(())
    }
}

struct Parser {
    tokens: Vec<(usize, Token)>,
    pos: usize,
    input_len: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(_, t)| t)
    }

    fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map(|(o, _)| *o)
            .unwrap_or(self.input_len)
    }

    fn unexpected(&self, expected: &'static str) -> ParseError {
        ParseError::Unexpected {
            offset: self.offset(),
            expected,
            found: self
                .peek()
                .map(Token::describe)
                .unwrap_or_else(|| "end of input".to_string()),
        }
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn ident(&mut self) -> Result<String, ParseError> {
        match self.peek() {
            Some(Token::Ident(name)) => {
                let name = name.clone();
                self.pos += 1;
                Ok(name)
            }
            _ => Err(self.unexpected("an identifier")),
        }
    }

    fn parse_type(&mut self, depth: usize) -> Result<TypeExpr, ParseError> {
        if depth > MAX_DEPTH {
            return Err(ParseError::NestedGeneric(format!(
                "type nested deeper than {} levels",
                MAX_DEPTH
            )));
        }

        let address = match self.peek() {
            Some(Token::Address(a)) => {
                let a = a.clone();
                self.pos += 1;
                if !self.eat(&Token::PathSep) {
                    return Err(self.unexpected("'::' after address"));
                }
                Some(a)
            }
            _ => None,
        };

        let mut path = vec![self.ident()?];
        while self.eat(&Token::PathSep) {
            path.push(self.ident()?);
        }

        let mut params = Vec::new();
        if self.eat(&Token::Open) {
            loop {
                params.push(self.parse_type(depth + 1)?);
                if self.eat(&Token::Comma) {
                    continue;
                }
                if self.eat(&Token::Close) {
                    break;
                }
                return Err(self.unexpected("',' or '>'"));
            }
        }

        Ok(TypeExpr {
            address,
            path,
            params,
        })
    }
}

/// Parse any type expression in canonical form
pub fn parse_type_expr(signature: &str) -> Result<TypeExpr, ParseError> {
    if signature.trim().is_empty() {
        return Err(ParseError::Empty);
    }

    let mut parser = Parser {
        tokens: tokenize(signature)?,
        pos: 0,
        input_len: signature.len(),
    };
    let expr = parser.parse_type(0)?;
    if parser.peek().is_some() {
        return Err(parser.unexpected("end of input"));
    }
    Ok(expr)
}

/// Type parameters of an escrow instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceTypes {
    /// Outer type without parameters, e.g. `0x..::simple_escrow::Escrow`
    pub base: String,
    pub deposit_type: TypeTag,
    pub payment_type: TypeTag,
}

/// Extract the deposit and payment types from `Outer<A::m1::T1, B::m2::T2>`.
///
/// Shapes other than exactly two plain struct parameters are a `ParseError`,
/// which callers treat as "type unknown".
pub fn parse_instance_type(signature: &str) -> Result<InstanceTypes, ParseError> {
    let expr = parse_type_expr(signature)?;
    if expr.params.len() != 2 {
        return Err(ParseError::Arity {
            expected: 2,
            found: expr.params.len(),
        });
    }

    let base = expr.base();
    let mut params = expr.params.into_iter();
    let (Some(deposit), Some(payment)) = (params.next(), params.next()) else {
        return Err(ParseError::Arity {
            expected: 2,
            found: 0,
        });
    };

    Ok(InstanceTypes {
        base,
        deposit_type: deposit.into_type_tag()?,
        payment_type: payment.into_type_tag()?,
    })
}
