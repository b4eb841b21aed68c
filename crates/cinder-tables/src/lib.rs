//! Pure lookup-table interfaces for the Cinder engine.
//!
//! Three physical quantities are resolved through tables: the Planck-mean
//! radiation-pressure efficiency ⟨Q_pr⟩(s, T), the self-shielding
//! transmission Φ(τ, ω₀, g), and the saturation vapor pressure P_sat(T).
//! Each is modeled as a closed enum with a tabulated variant and an
//! analytic-fallback variant, selected at configuration time. Queries are
//! pure: repeated identical queries return identical values.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod efficiency;
pub mod transmission;
pub mod vapor;

mod interp;

pub use efficiency::{AnalyticQpr, Efficiency, QprTable};
pub use transmission::{AnalyticPhi, PhiTable, Transmission};
pub use vapor::{PsatTable, VaporPressure};
