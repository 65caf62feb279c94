//! BER (Basic Encoding Rules) codec for the proxy wire protocol
//!
//! Every message on the wire is a single BER value: an identifier, a
//! definite length and the contents octets.
//!
//! ```text
//! [Identifier] [Length] [Contents]
//! ```
//!
//! ## Identifier Encoding
//!
//! ```text
//! Bits: 8 7 6 5 4 3 2 1
//!       C C P T T T T T
//! ```
//! - CC = Class (00=Universal, 01=Application, 10=Context, 11=Private)
//! - P = Primitive (0) or Constructed (1)
//! - TTTTT = Tag number (0-30), or 11111 followed by base-128 octets
//!
//! ## Length Encoding
//!
//! Short form for 0-127, long form with up to four big-endian length
//! octets otherwise. The indefinite form is not supported.
//!
//! ## Supported Types
//!
//! | Type         | Tag | Value              |
//! |--------------|-----|--------------------|
//! | EOC          | 0   | none               |
//! | BOOLEAN      | 1   | `bool`             |
//! | INTEGER      | 2   | `i32`              |
//! | OCTET STRING | 4   | bytes + charset    |
//! | NULL         | 5   | none               |
//! | ENUMERATED   | 10  | `i32`              |
//! | SEQUENCE     | 16  | ordered children   |
//!
//! Application-class values reuse these shapes; a [`BerModule`] maps their
//! identifiers to shapes when decoding.

mod stream;

pub mod contents;
pub mod identifier;
pub mod length;
pub mod module;
pub mod object;

pub use contents::BerContentsReader;
pub use identifier::{Form, Identifier, TagClass};
pub use length::BerLength;
pub use module::{MAX_NESTING_DEPTH, BerModule, BerModuleBuilder, BerObjectFactory};
pub use object::{BerBoolean, BerContents, BerInteger, BerNull, BerObject, BerOctetString, BerSequence};
