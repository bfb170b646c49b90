//! panelgrid Percentage Codec
//!
//! Converts between sampled cell boxes and a compact, renderer-independent
//! percentage vector, and between that vector and the durable wire record.
//!
//! # Example
//!
//! ```
//! use panelgrid_codec::{CellBox, Codec};
//!
//! let codec = Codec::builtin();
//! let boxes = [
//!     CellBox::new(0.0, 70.0, 30.0, 100.0),
//!     CellBox::new(0.0, 0.0, 70.0, 100.0),
//! ];
//!
//! let vector = codec.encode("two-column", &boxes).unwrap();
//! assert_eq!(vector.to_csv(), "70.00,30.00");
//!
//! let map = codec.decode("two-column", &vector).unwrap();
//! assert_eq!(map.len(), 2);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod cell_box;
pub mod codec;
pub mod error;
pub mod fraction;
mod groups;
pub mod raw;
pub mod vector;

// Re-exports for convenience
pub use cell_box::{CellBox, ContainerSize, PixelRect};
pub use codec::{Codec, CodecConfig};
pub use error::{CodecError, CodecResult};
pub use fraction::{CssBox, PixelFractionMap};
pub use raw::{RawPositionRecord, RAW_DELIMITER};
pub use vector::{ParseVectorError, PercentageVector};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
