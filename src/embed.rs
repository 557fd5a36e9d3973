//! XEMBED handshake and close negotiation with hosted windows.
//!
//! All messages are fire-and-forget; nothing here waits for an answer.

use crate::Xid;
use crate::drivers::{DisplayDriver, XEMBED_FOCUS_CURRENT, XEmbedMessage};
use crate::error::FrameResult;
use crate::keybindings::KeyBindings;
use crate::layout::Rect;
use crate::registry::Client;

/// Protocol version advertised in `EMBEDDED_NOTIFY`.
pub const XEMBED_VERSION: u32 = 0;

/// Pull `window` into the frame and announce the frame as its embedder.
///
/// Key grabs go onto the client too, so bindings fire while it holds input
/// focus.
pub fn embed<D: DisplayDriver + ?Sized>(
    driver: &mut D,
    window: Xid,
    content: Rect,
    bindings: &KeyBindings,
) -> FrameResult<()> {
    let embedder = driver.frame_window();
    driver.reparent_into_frame(window, content)?;
    driver.watch_client(window)?;
    driver.send_xembed(
        window,
        XEmbedMessage::EmbeddedNotify,
        0,
        embedder,
        XEMBED_VERSION,
    )?;
    driver.grab_keys(window, bindings)?;
    driver.map(window)?;
    tracing::debug!(window, embedder, "embedded window");
    Ok(())
}

/// Tell a newly selected client it is active and owns focus. The previous
/// selection gets no deactivation; it is simply covered.
pub fn activate<D: DisplayDriver + ?Sized>(driver: &mut D, window: Xid) -> FrameResult<()> {
    driver.send_xembed(window, XEmbedMessage::WindowActivate, 0, 0, 0)?;
    driver.send_xembed(
        window,
        XEmbedMessage::FocusIn,
        XEMBED_FOCUS_CURRENT,
        0,
        0,
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    /// A delete request is already outstanding; nothing was sent.
    AlreadyPending,
    DeleteRequested,
    Killed,
}

/// Ask `client` to go away: politely if it speaks `WM_DELETE_WINDOW`,
/// forcibly otherwise. The client stays registered until the window itself
/// is destroyed or unmapped.
pub fn request_close<D: DisplayDriver + ?Sized>(
    driver: &mut D,
    client: &mut Client,
) -> FrameResult<CloseOutcome> {
    if client.close_pending {
        tracing::debug!(window = client.handle, "close already requested");
        return Ok(CloseOutcome::AlreadyPending);
    }
    if driver.supports_delete(client.handle)? {
        driver.send_delete(client.handle)?;
        client.close_pending = true;
        tracing::info!(window = client.handle, "sent delete request");
        Ok(CloseOutcome::DeleteRequested)
    } else {
        driver.kill(client.handle)?;
        tracing::info!(window = client.handle, "killed client");
        Ok(CloseOutcome::Killed)
    }
}
