/*
 * Recovery of the notification-area icon after the taskbar is recreated.
 * The shell may still know the icon, so a modify is tried before an add;
 * adding a known icon would fail and leave the version unset.
 */
use crate::error::AppResult;

/// The shell operations used on the tray icon.
pub trait IconNotifier {
    /// Updates an icon the shell already knows.
    fn modify_icon(&self) -> AppResult<()>;

    /// Adds the icon and selects the notification version.
    fn add_icon(&self) -> AppResult<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconRestore {
    StillPresent,
    Readded,
}

pub fn restore_icon(notifier: &dyn IconNotifier) -> AppResult<IconRestore> {
    match notifier.modify_icon() {
        Ok(()) => {
            log::debug!("Tray: Icon still present after taskbar restart.");
            Ok(IconRestore::StillPresent)
        }
        Err(err) => {
            log::info!("Tray: Re-adding icon after taskbar restart ({err}).");
            notifier.add_icon()?;
            Ok(IconRestore::Readded)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use std::cell::{Cell, RefCell};

    #[derive(Default)]
    struct RecordingNotifier {
        calls: RefCell<Vec<&'static str>>,
        icon_known: Cell<bool>,
        add_rejected: Cell<bool>,
    }

    impl IconNotifier for RecordingNotifier {
        fn modify_icon(&self) -> AppResult<()> {
            self.calls.borrow_mut().push("modify");
            if self.icon_known.get() {
                Ok(())
            } else {
                Err(AppError::win32("Shell_NotifyIconW(NIM_MODIFY)", 0))
            }
        }

        fn add_icon(&self) -> AppResult<()> {
            self.calls.borrow_mut().push("add");
            if self.add_rejected.get() {
                return Err(AppError::win32("Shell_NotifyIconW(NIM_ADD)", 0));
            }
            self.icon_known.set(true);
            Ok(())
        }
    }

    #[test]
    fn known_icon_is_only_modified() {
        // Arrange
        let notifier = RecordingNotifier::default();
        notifier.icon_known.set(true);

        // Act
        let outcome = restore_icon(&notifier);

        // Assert
        assert_eq!(outcome.ok(), Some(IconRestore::StillPresent));
        assert_eq!(*notifier.calls.borrow(), vec!["modify"]);
    }

    #[test]
    fn forgotten_icon_is_added_after_modify_fails() {
        // Arrange
        let notifier = RecordingNotifier::default();

        // Act
        let outcome = restore_icon(&notifier);

        // Assert
        assert_eq!(outcome.ok(), Some(IconRestore::Readded));
        assert_eq!(*notifier.calls.borrow(), vec!["modify", "add"]);
        assert!(notifier.icon_known.get());
    }

    #[test]
    fn failed_add_is_reported() {
        // Arrange
        let notifier = RecordingNotifier::default();
        notifier.add_rejected.set(true);

        // Act
        let outcome = restore_icon(&notifier);

        // Assert
        assert!(outcome.is_err());
        assert_eq!(*notifier.calls.borrow(), vec!["modify", "add"]);
    }
}
