use crate::application::repos::RepoError;

/// Map a raw sqlx failure onto the repository error taxonomy.
pub fn map_sqlx_error(err: sqlx::Error) -> RepoError {
    match err {
        sqlx::Error::PoolTimedOut => RepoError::Timeout,
        other => RepoError::from_persistence(other),
    }
}
