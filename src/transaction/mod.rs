// Transaction module - manual-commit surrounding for fixture work

use crate::conductor::Session;
use crate::connection::{Connection, IsolationLevel};
use crate::core::Result;

/// Connection settings captured before a transaction starts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SavedState {
    pub auto_commit: bool,
    pub isolation: Option<IsolationLevel>,
}

impl SavedState {
    pub fn capture(conn: &mut dyn Connection) -> Result<Self> {
        Ok(Self {
            auto_commit: conn.auto_commit()?,
            isolation: conn.isolation()?,
        })
    }

    /// Puts the captured settings back. Isolation is only touched when it
    /// was overridden.
    pub fn restore(&self, conn: &mut dyn Connection, overridden: bool) -> Result<()> {
        if overridden {
            if let Some(level) = self.isolation {
                conn.set_isolation(level)?;
            }
        }
        conn.set_auto_commit(self.auto_commit)
    }
}

/// Runs `f` in manual-commit mode.
///
/// On success the work is committed; on any failure (including a failed
/// commit) it is rolled back. Either way the prior auto-commit and
/// isolation settings are restored before returning. A rollback or restore
/// failure that follows an earlier error is logged and the earlier error is
/// returned; a restore failure after a successful commit is returned.
pub fn within<T, F>(session: &mut Session, isolation: Option<IsolationLevel>, f: F) -> Result<T>
where
    F: FnOnce(&mut Session) -> Result<T>,
{
    let saved = SavedState::capture(session.connection())?;

    let outcome = match run(session, isolation, f) {
        Ok(value) => Ok(value),
        Err(err) => {
            log::debug!("rolling back: {err}");
            if let Err(rollback) = session.connection().rollback() {
                log::warn!("rollback failed after '{err}': {rollback}");
            }
            Err(err)
        }
    };

    let restored = saved.restore(session.connection(), isolation.is_some());
    match (outcome, restored) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(err)) => Err(err),
        (Err(err), Ok(())) => Err(err),
        (Err(err), Err(restore)) => {
            log::warn!("could not restore connection state after '{err}': {restore}");
            Err(err)
        }
    }
}

fn run<T, F>(session: &mut Session, isolation: Option<IsolationLevel>, f: F) -> Result<T>
where
    F: FnOnce(&mut Session) -> Result<T>,
{
    let conn = session.connection();
    conn.set_auto_commit(false)?;
    if let Some(level) = isolation {
        conn.set_isolation(level)?;
    }
    let value = f(session)?;
    session.connection().commit()?;
    Ok(value)
}
