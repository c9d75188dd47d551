//! Decoder for Paradox table files.
//!
//! Reads `.DB` headers into [`TableDescriptor`]s, walks their data blocks into
//! rows of [`Value`](crate::datum::Value)s, resolves memo/blob payloads from
//! `.MB` files and exposes `.PX` primary key headers.

mod block;
mod charset;
mod error;
mod field;
mod field_type;
mod header;
mod memo;
mod primary_key;
mod table;

pub use block::TableData;
pub use charset::{decode_text, encoding_for_code_page, resolve_charset};
pub use error::{DataError, DataResult};
pub use field::{FieldContext, FieldParser, find_parser, parse_field};
pub use field_type::{BCD_STORAGE_SIZE, FieldType};
pub use header::{FieldDescriptor, TableHeader};
pub use memo::{MemoFile, MemoPointer};
pub use primary_key::PrimaryKeyDescriptor;
pub use table::{DecodeOptions, TableDescriptor};
