//! Parser for serialized (reflection-style) type names.
//!
//! Attribute blobs store `System.Type` arguments and enum types as strings such as
//! `Acme.Outer+Inner`1[[System.Int32, mscorlib]][], Acme.Lib, Version=1.0.0.0`. This module
//! splits such a string into its namespace, nesting chain, generic arguments, suffixes and
//! assembly name. Resolving the parsed name against a resolution context happens in
//! [`crate::metadata::customattributes`].

use crate::Result;

/// A decoration following a type name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeNameSuffix {
    /// `[]`
    SzArray,
    /// `[,]`, `[*]` and friends, with the rank
    Array(u32),
    /// `*`
    Pointer,
    /// `&`
    ByRef,
}

/// A parsed serialized type name
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TypeName {
    /// Namespace of the top-level type
    pub namespace: String,
    /// Metadata names of the top-level type followed by each nested type
    pub names: Vec<String>,
    /// Generic arguments, outermost first
    pub generic_args: Vec<TypeName>,
    /// Array, pointer and by-ref decorations in source order
    pub suffixes: Vec<TypeNameSuffix>,
    /// Simple name of the assembly qualification, if any
    pub assembly: Option<String>,
}

impl TypeName {
    /// Parses a serialized type name
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] for empty names, unbalanced brackets or trailing
    /// characters.
    pub fn parse(input: &str) -> Result<TypeName> {
        let mut parser = NameParser {
            chars: input.chars().collect(),
            pos: 0,
        };
        let name = parser.parse_name(true)?;
        parser.skip_whitespace();
        if parser.pos != parser.chars.len() {
            return Err(malformed_error!(
                "Unexpected '{}' in type name '{}'",
                parser.chars[parser.pos],
                input
            ));
        }
        Ok(name)
    }

    /// `Namespace.Name` of the top-level type
    #[must_use]
    pub fn top_level_full_name(&self) -> String {
        let top = self.names.first().map_or("", String::as_str);
        if self.namespace.is_empty() {
            top.to_string()
        } else {
            format!("{}.{}", self.namespace, top)
        }
    }

    /// `Namespace.Outer+Inner`, without generic arguments or suffixes
    #[must_use]
    pub fn nested_full_name(&self) -> String {
        let mut name = self.top_level_full_name();
        for nested in self.names.iter().skip(1) {
            name.push('+');
            name.push_str(nested);
        }
        name
    }
}

struct NameParser {
    chars: Vec<char>,
    pos: usize,
}

impl NameParser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, expected: char) -> Result<()> {
        match self.peek() {
            Some(c) if c == expected => {
                self.pos += 1;
                Ok(())
            }
            Some(c) => Err(malformed_error!("Expected '{}' in type name, found '{}'", expected, c)),
            None => Err(malformed_error!("Expected '{}' in type name, found end", expected)),
        }
    }

    fn identifier(&mut self) -> Result<String> {
        self.skip_whitespace();
        let mut ident = String::new();
        while let Some(c) = self.peek() {
            match c {
                '\\' => {
                    self.pos += 1;
                    match self.peek() {
                        Some(escaped) => ident.push(escaped),
                        None => return Err(malformed_error!("Dangling escape in type name")),
                    }
                }
                '+' | '[' | ']' | ',' | '*' | '&' => break,
                _ => ident.push(c),
            }
            self.pos += 1;
        }

        let ident = ident.trim_end().to_string();
        if ident.is_empty() {
            return Err(malformed_error!("Empty identifier in type name"));
        }
        Ok(ident)
    }

    fn parse_name(&mut self, allow_assembly: bool) -> Result<TypeName> {
        let dotted = self.identifier()?;
        let (namespace, top) = match dotted.rsplit_once('.') {
            Some((namespace, top)) => (namespace.to_string(), top.to_string()),
            None => (String::new(), dotted),
        };

        let mut name = TypeName {
            namespace,
            names: vec![top],
            ..TypeName::default()
        };

        while self.peek() == Some('+') {
            self.pos += 1;
            name.names.push(self.identifier()?);
        }

        if self.peek() == Some('[') && !matches!(self.peek_at(1), Some(']' | ',' | '*')) {
            self.pos += 1;
            loop {
                self.skip_whitespace();
                if self.peek() == Some('[') {
                    self.pos += 1;
                    name.generic_args.push(self.parse_name(true)?);
                    self.skip_whitespace();
                    self.expect(']')?;
                } else {
                    name.generic_args.push(self.parse_name(false)?);
                }

                self.skip_whitespace();
                match self.peek() {
                    Some(',') => self.pos += 1,
                    Some(']') => {
                        self.pos += 1;
                        break;
                    }
                    _ => return Err(malformed_error!("Unterminated generic argument list")),
                }
            }
        }

        self.parse_suffixes(&mut name)?;

        self.skip_whitespace();
        if allow_assembly && self.peek() == Some(',') {
            self.pos += 1;
            let start = self.pos;
            while self.peek().is_some_and(|c| c != ']') {
                self.pos += 1;
            }
            let qualification: String = self.chars[start..self.pos].iter().collect();
            let simple = qualification.split(',').next().unwrap_or("").trim();
            if simple.is_empty() {
                return Err(malformed_error!("Empty assembly name in type name"));
            }
            name.assembly = Some(simple.to_string());
        }

        Ok(name)
    }

    fn parse_suffixes(&mut self, name: &mut TypeName) -> Result<()> {
        loop {
            match self.peek() {
                Some('*') => {
                    self.pos += 1;
                    name.suffixes.push(TypeNameSuffix::Pointer);
                }
                Some('&') => {
                    self.pos += 1;
                    name.suffixes.push(TypeNameSuffix::ByRef);
                }
                Some('[') if matches!(self.peek_at(1), Some(']' | ',' | '*')) => {
                    self.pos += 1;
                    let mut rank = 1;
                    let mut bounded = false;
                    loop {
                        match self.peek() {
                            Some(']') => {
                                self.pos += 1;
                                break;
                            }
                            Some(',') => rank += 1,
                            Some('*') => bounded = true,
                            _ => return Err(malformed_error!("Malformed array suffix")),
                        }
                        self.pos += 1;
                    }
                    name.suffixes.push(if rank == 1 && !bounded {
                        TypeNameSuffix::SzArray
                    } else {
                        TypeNameSuffix::Array(rank)
                    });
                }
                _ => return Ok(()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_and_nested() {
        let name = TypeName::parse("Acme.Outer+Inner").unwrap();
        assert_eq!(name.namespace, "Acme");
        assert_eq!(name.names, vec!["Outer".to_string(), "Inner".to_string()]);
        assert_eq!(name.top_level_full_name(), "Acme.Outer");
        assert_eq!(name.nested_full_name(), "Acme.Outer+Inner");
        assert!(name.assembly.is_none());

        let global = TypeName::parse("Global").unwrap();
        assert_eq!(global.namespace, "");
        assert_eq!(global.top_level_full_name(), "Global");
    }

    #[test]
    fn assembly_qualified_generic() {
        let name = TypeName::parse(
            "System.Collections.Generic.Dictionary`2[[System.String, mscorlib],[Acme.Widget, Acme, Version=1.0.0.0]][], System.Collections, Version=4.0.0.0",
        )
        .unwrap();

        assert_eq!(name.top_level_full_name(), "System.Collections.Generic.Dictionary`2");
        assert_eq!(name.generic_args.len(), 2);
        assert_eq!(name.generic_args[0].assembly.as_deref(), Some("mscorlib"));
        assert_eq!(name.generic_args[1].top_level_full_name(), "Acme.Widget");
        assert_eq!(name.generic_args[1].assembly.as_deref(), Some("Acme"));
        assert_eq!(name.suffixes, vec![TypeNameSuffix::SzArray]);
        assert_eq!(name.assembly.as_deref(), Some("System.Collections"));
    }

    #[test]
    fn unqualified_generic_arguments() {
        let name = TypeName::parse("N.Pair`2[N.A,N.B]").unwrap();
        assert_eq!(name.generic_args.len(), 2);
        assert_eq!(name.generic_args[1].top_level_full_name(), "N.B");
        assert!(name.assembly.is_none());
    }

    #[test]
    fn suffixes() {
        let name = TypeName::parse("N.T*[,][*]&").unwrap();
        assert_eq!(
            name.suffixes,
            vec![
                TypeNameSuffix::Pointer,
                TypeNameSuffix::Array(2),
                TypeNameSuffix::Array(1),
                TypeNameSuffix::ByRef
            ]
        );
    }

    #[test]
    fn escaped_characters() {
        let name = TypeName::parse(r"N.Odd\+Name").unwrap();
        assert_eq!(name.names, vec!["Odd+Name".to_string()]);
    }

    #[test]
    fn malformed_names() {
        assert!(TypeName::parse("").is_err());
        assert!(TypeName::parse("N.T[[System.Int32]").is_err());
        assert!(TypeName::parse("N.T, ").is_err());
        assert!(TypeName::parse("N.T]").is_err());
    }
}
