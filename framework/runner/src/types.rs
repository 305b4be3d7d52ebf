/// Recommended error type for your scenario `main` function. Compatible with the result of
/// [crate::run::run] so you can use `?` to propagate errors.
pub type BreezeResult<T> = anyhow::Result<T>;
