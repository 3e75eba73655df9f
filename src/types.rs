/*
 * Platform-agnostic identifiers shared by the lifecycle core, the tray
 * controller and the log viewer. Nothing here touches Win32 directly, so
 * these types compile (and are unit tested) on every platform.
 */
use std::fmt;

/*
 * Opaque identifier for a created native window. The OS owns the window;
 * this value only references it and becomes stale after destruction.
 */
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowHandle(pub isize);

impl WindowHandle {
    pub const NULL: WindowHandle = WindowHandle(0);

    pub fn is_null(self) -> bool {
        self == WindowHandle::NULL
    }
}

impl fmt::Debug for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WindowHandle({:#x})", self.0)
    }
}

/*
 * A native message reduced to its raw words. Window kinds crack `wparam` and
 * `lparam` themselves; the dispatch layer only needs the id and the handle.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowMessage {
    pub handle: WindowHandle,
    pub id: u32,
    pub wparam: usize,
    pub lparam: isize,
}

impl WindowMessage {
    pub fn new(handle: WindowHandle, id: u32, wparam: usize, lparam: isize) -> Self {
        WindowMessage {
            handle,
            id,
            wparam,
            lparam,
        }
    }
}

/// Message ids the portable lifecycle and dispatch code needs to recognise.
pub mod wm {
    pub const CREATE: u32 = 0x0001;
    pub const DESTROY: u32 = 0x0002;
    pub const CLOSE: u32 = 0x0010;
    pub const GETMINMAXINFO: u32 = 0x0024;
    pub const NCCREATE: u32 = 0x0081;
    pub const NCDESTROY: u32 = 0x0082;
}

macro_rules! command_ids {
    ($($name:ident = $value:expr),+ $(,)?) => {
        /*
         * Every menu, accelerator and dialog command understood by the
         * application. The numeric values double as the persisted
         * `LeftClickAction` registry value.
         */
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u16)]
        pub enum CommandId {
            $($name = $value),+
        }

        impl CommandId {
            pub const ALL: &'static [CommandId] = &[$(CommandId::$name),+];

            pub fn raw(self) -> u16 {
                self as u16
            }

            pub fn from_raw(raw: u32) -> Option<CommandId> {
                match raw {
                    $(v if v == $value => Some(CommandId::$name),)+
                    _ => None,
                }
            }
        }
    };
}

command_ids! {
    // Dialog buttons share the system IDOK/IDCANCEL values.
    DialogOk = 1,
    DialogCancel = 2,

    CascadeWindows = 32771,
    ShowWindowsStacked = 32772,
    ShowWindowsSideBySide = 32773,
    ShowTheDesktop = 32774,
    UndoMinimize = 32775,
    Exit = 32776,

    DefaultCascadeWindows = 32781,
    DefaultShowWindowsStacked = 32782,
    DefaultShowWindowsSideBySide = 32783,
    DefaultShowTheDesktop = 32784,
    DefaultUndoMinimize = 32785,

    SettingsAutoStart = 32791,
    SettingsLogging = 32792,
    SettingsDefaultTiling = 32793,
    SettingsOpenLogFile = 32794,

    ViewerReload = 32801,
    ViewerClose = 32802,
    EditCopy = 32811,
    EditSelectAll = 32812,
    EditFind = 32813,
    EditFindNext = 32814,
    EditFindPrevious = 32815,
    EditGoto = 32816,
    ViewLineNumbers = 32821,
    ViewStatusBar = 32822,
    ZoomIn = 32831,
    ZoomOut = 32832,
}

impl CommandId {
    /// Commands a tray left-click may be bound to, in menu order.
    pub const TRAY_ACTIONS: [CommandId; 5] = [
        CommandId::CascadeWindows,
        CommandId::ShowWindowsStacked,
        CommandId::ShowWindowsSideBySide,
        CommandId::ShowTheDesktop,
        CommandId::UndoMinimize,
    ];

    pub fn is_tray_action(self) -> bool {
        Self::TRAY_ACTIONS.contains(&self)
    }
}

/*
 * Identifies a submenu so one "menu about to open" handler can refresh the
 * right items without relying on menu positions. Zero means "untagged".
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenuTag {
    TraySettings,
    TrayLeftClickDoes,
    ViewerFile,
    ViewerEdit,
    ViewerView,
    ViewerZoom,
}

impl MenuTag {
    pub fn raw(self) -> usize {
        match self {
            MenuTag::TraySettings => 1,
            MenuTag::TrayLeftClickDoes => 2,
            MenuTag::ViewerFile => 3,
            MenuTag::ViewerEdit => 4,
            MenuTag::ViewerView => 5,
            MenuTag::ViewerZoom => 6,
        }
    }

    pub fn from_raw(raw: usize) -> Option<MenuTag> {
        match raw {
            1 => Some(MenuTag::TraySettings),
            2 => Some(MenuTag::TrayLeftClickDoes),
            3 => Some(MenuTag::ViewerFile),
            4 => Some(MenuTag::ViewerEdit),
            5 => Some(MenuTag::ViewerView),
            6 => Some(MenuTag::ViewerZoom),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_ids_are_unique_and_resolve_back() {
        // Arrange
        let mut seen = std::collections::HashSet::new();

        // Act / Assert
        for id in CommandId::ALL {
            assert!(seen.insert(id.raw()), "duplicate id {id:?}");
            assert_eq!(CommandId::from_raw(id.raw() as u32), Some(*id));
        }
    }

    #[test]
    fn unknown_command_id_is_rejected() {
        assert_eq!(CommandId::from_raw(0), None);
        assert_eq!(CommandId::from_raw(99_999), None);
    }

    #[test]
    fn menu_tag_zero_means_untagged() {
        assert_eq!(MenuTag::from_raw(0), None);
        for tag in [
            MenuTag::TraySettings,
            MenuTag::TrayLeftClickDoes,
            MenuTag::ViewerFile,
            MenuTag::ViewerEdit,
            MenuTag::ViewerView,
            MenuTag::ViewerZoom,
        ] {
            assert_eq!(MenuTag::from_raw(tag.raw()), Some(tag));
        }
    }
}
