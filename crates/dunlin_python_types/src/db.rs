/// Database giving access to the interned type universe.
///
/// The algebra itself adds no methods on top of [`salsa::Database`]; the
/// trait exists so that an embedding checker can layer its own queries on
/// the same database.
#[salsa::db]
pub trait Db: salsa::Database {}
