/// Data layer: core types, loading, and filtering.
///
/// Architecture:
/// ```text
///  .xlsx / .csv / .json
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse + clean file → Dataset  (TTL-memoized per path)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ Dataset   │  named optional columns, every row has lat/lon
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  apply criteria → filtered row indices
///   └──────────┘
/// ```

pub mod loader;
pub mod model;
pub mod filter;
