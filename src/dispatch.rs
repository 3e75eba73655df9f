/*
 * Association between native window handles and the window objects that own
 * them, plus the routing decision for messages that arrive before an owner
 * is bound or after it is gone.
 *
 * The registry is thread-local: all windows live on the UI thread and the
 * OS delivers their messages on that thread. Owners are held weakly so a
 * dropped window object simply stops receiving messages.
 */
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::{Rc, Weak};

use crate::error::{AppError, AppResult};
use crate::lifecycle::WindowProcedure;
use crate::types::{WindowHandle, WindowMessage, wm};

thread_local! {
    static OWNERS: RefCell<HashMap<WindowHandle, Weak<dyn WindowProcedure>>> =
        RefCell::new(HashMap::new());

    // Handles whose creation messages were seen without an owner.
    static UNBOUND_CREATIONS: RefCell<HashSet<WindowHandle>> =
        RefCell::new(HashSet::new());
}

/// What to do with a message for a handle that has no live owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnboundDisposition {
    UseDefault,
    Fail(isize),
}

/*
 * Creation messages without an owner abort creation (FALSE for NCCREATE,
 * -1 for CREATE). Once such a creation was observed, the remaining messages
 * for that handle are answered with 0, except the final NCDESTROY which is
 * left to the default procedure.
 */
pub fn unbound_disposition(message_id: u32, creation_observed: bool) -> UnboundDisposition {
    match message_id {
        wm::NCCREATE => UnboundDisposition::Fail(0),
        wm::CREATE => UnboundDisposition::Fail(-1),
        wm::NCDESTROY => UnboundDisposition::UseDefault,
        _ if creation_observed => UnboundDisposition::Fail(0),
        _ => UnboundDisposition::UseDefault,
    }
}

/*
 * Binds `owner` to `handle` and records the handle on the owner. Called
 * once per window, as early as the platform can (WM_NCCREATE on Win32).
 */
pub fn bind(handle: WindowHandle, owner: &Rc<dyn WindowProcedure>) -> AppResult<()> {
    if handle.is_null() {
        return Err(AppError::app("Dispatch: cannot bind a null window handle"));
    }

    let already_bound = OWNERS.with(|owners| {
        let mut owners = owners.borrow_mut();
        let live = owners
            .get(&handle)
            .is_some_and(|existing| existing.strong_count() > 0);
        if !live {
            owners.insert(handle, Rc::downgrade(owner));
        }
        live
    });
    if already_bound {
        return Err(AppError::app(format!(
            "Dispatch: {handle:?} is already bound to a window object"
        )));
    }

    owner.base().attach(handle);
    log::trace!("Dispatch: Bound {handle:?}.");
    Ok(())
}

pub fn unbind(handle: WindowHandle) {
    let removed = OWNERS.with(|owners| owners.borrow_mut().remove(&handle).is_some());
    UNBOUND_CREATIONS.with(|seen| seen.borrow_mut().remove(&handle));
    if removed {
        log::trace!("Dispatch: Unbound {handle:?}.");
    }
}

pub fn lookup(handle: WindowHandle) -> Option<Rc<dyn WindowProcedure>> {
    OWNERS.with(|owners| owners.borrow().get(&handle).and_then(Weak::upgrade))
}

/*
 * Routes one message. Bound windows get their own `route_message`; the
 * binding is dropped after NCDESTROY, the last message a window receives.
 * Unbound handles follow `unbound_disposition`, with `fallback` standing in
 * for the OS default procedure.
 */
pub fn route<F>(msg: &WindowMessage, fallback: F) -> isize
where
    F: FnOnce(&WindowMessage) -> isize,
{
    if let Some(owner) = lookup(msg.handle) {
        let result = owner.route_message(msg);
        if msg.id == wm::NCDESTROY {
            unbind(msg.handle);
        }
        return result;
    }

    let observed = UNBOUND_CREATIONS.with(|seen| {
        let mut seen = seen.borrow_mut();
        if msg.id == wm::NCCREATE || msg.id == wm::CREATE {
            seen.insert(msg.handle);
        }
        seen.contains(&msg.handle)
    });

    match unbound_disposition(msg.id, observed) {
        UnboundDisposition::Fail(result) => {
            log::warn!(
                "Dispatch: Message {:#06x} for unbound {:?} rejected.",
                msg.id,
                msg.handle
            );
            result
        }
        UnboundDisposition::UseDefault => {
            if msg.id == wm::NCDESTROY {
                unbind(msg.handle);
            }
            fallback(msg)
        }
    }
}
