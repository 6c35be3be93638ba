//! Types attached to tree nodes and symbols

use std::fmt;

/// Type tag carried by every node and symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Type {
    Integer,
    Void,
    IntegerArray,
    VoidArray,
    /// Type of an error-recovery placeholder
    Undetermined,
    /// Not computed (statements, or nodes not yet visited)
    #[default]
    None,
}

impl Type {
    /// Array type whose element is `self`
    pub fn array_of(self) -> Type {
        match self {
            Type::Integer => Type::IntegerArray,
            Type::Void => Type::VoidArray,
            _ => Type::None,
        }
    }

    pub fn is_void(self) -> bool {
        matches!(self, Type::Void | Type::VoidArray)
    }

    /// True once a concrete language type has been assigned
    pub fn is_resolved(self) -> bool {
        !matches!(self, Type::Undetermined | Type::None)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Type::Integer => "int",
            Type::Void => "void",
            Type::IntegerArray => "int[]",
            Type::VoidArray => "void[]",
            Type::Undetermined => "undetermined",
            Type::None => "none",
        };
        f.pad(s)
    }
}

/// Binary operator codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    Plus,
    Minus,
    Times,
    Over,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Opcode::Plus => "+",
            Opcode::Minus => "-",
            Opcode::Times => "*",
            Opcode::Over => "/",
            Opcode::Lt => "<",
            Opcode::Le => "<=",
            Opcode::Gt => ">",
            Opcode::Ge => ">=",
            Opcode::Eq => "==",
            Opcode::Ne => "!=",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_array_of() {
        assert_eq!(Type::Integer.array_of(), Type::IntegerArray);
        assert_eq!(Type::Void.array_of(), Type::VoidArray);
        assert_eq!(Type::IntegerArray.array_of(), Type::None);
    }

    #[test]
    fn test_resolved() {
        assert!(Type::Void.is_resolved());
        assert!(Type::IntegerArray.is_resolved());
        assert!(!Type::Undetermined.is_resolved());
        assert!(!Type::None.is_resolved());
        assert!(Type::VoidArray.is_void());
    }
}
