//! Keeps the roster in step with the session.
//!
//! Login loads the owner's students; logout clears them.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::models::Session;
use crate::notify::Notifier;
use crate::roster::{Roster, RosterError, StudentStore};
use crate::session::{IdentityProvider, SessionHub};

const LOAD_FAILED: &str = "Failed to load students";

/// Follow `hub` until it is dropped. The subscription is taken before the
/// task starts, so the current session is always handled first.
pub fn spawn_session_sync<P, S>(
    hub: &SessionHub<P>,
    roster: Arc<Roster<S>>,
    notifier: Notifier,
) -> JoinHandle<()>
where
    P: IdentityProvider,
    S: StudentStore,
{
    let mut subscription = hub.subscribe();

    tokio::spawn(async move {
        while let Some(session) = subscription.next().await {
            match session {
                Session::Authenticated { identity } => match roster.load(&identity).await {
                    Ok(_) => {}
                    Err(RosterError::SessionChanged) => {
                        debug!(uid = %identity.uid, "Roster load superseded");
                    }
                    Err(RosterError::Storage(failure)) => {
                        error!(uid = %identity.uid, error = %failure, "Roster load failed");
                        notifier.error(failure.message);
                    }
                    Err(e) => {
                        warn!(uid = %identity.uid, error = %e, "Roster load failed");
                        notifier.error(LOAD_FAILED);
                    }
                },
                Session::Anonymous => roster.clear().await,
            }
        }
        debug!("Session hub closed; roster sync stopped");
    })
}
