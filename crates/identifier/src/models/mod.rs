mod identifier;

pub use self::identifier::Identifier;
