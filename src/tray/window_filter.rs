/*
 * Selection of the top-level windows the tile and cascade actions operate
 * on. The OS's own choice includes hidden helpers and windows on other
 * virtual desktops, so the set is rebuilt from the windows a user would see
 * in Alt+Tab: visible, owner-root windows with a title that are neither
 * cloaked, disabled, tool windows nor minimized, and never the desktop.
 */

/// Observed attributes of one top-level window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowAttributes {
    pub visible: bool,
    /// The window is the last visible active popup of its root owner.
    pub is_alt_tab_root: bool,
    pub is_shell_window: bool,
    pub disabled: bool,
    pub tool_window: bool,
    pub cloaked: bool,
    pub has_title: bool,
    pub title_bar_invisible: bool,
    pub iconic: bool,
}

impl Default for WindowAttributes {
    /// An ordinary application window.
    fn default() -> Self {
        WindowAttributes {
            visible: true,
            is_alt_tab_root: true,
            is_shell_window: false,
            disabled: false,
            tool_window: false,
            cloaked: false,
            has_title: true,
            title_bar_invisible: false,
            iconic: false,
        }
    }
}

impl WindowAttributes {
    pub fn is_tileable(&self) -> bool {
        self.visible
            && self.is_alt_tab_root
            && !self.is_shell_window
            && !self.disabled
            && !self.tool_window
            && !self.cloaked
            && self.has_title
            && !self.title_bar_invisible
            && !self.iconic
    }
}

/// Keeps the handles whose attributes pass `is_tileable`, in input order.
pub fn tileable<H: Copy>(windows: impl IntoIterator<Item = (H, WindowAttributes)>) -> Vec<H> {
    windows
        .into_iter()
        .filter(|(_, attributes)| attributes.is_tileable())
        .map(|(handle, _)| handle)
        .collect()
}

#[cfg(target_os = "windows")]
pub(crate) use win32::enumerate_tileable;

#[cfg(target_os = "windows")]
mod win32 {
    use super::{WindowAttributes, tileable};
    use windows::Win32::Foundation::{HWND, LPARAM};
    use windows::Win32::Graphics::Dwm::{DWMWA_CLOAKED, DwmGetWindowAttribute};
    use windows::Win32::UI::Controls::STATE_SYSTEM_INVISIBLE;
    use windows::Win32::UI::WindowsAndMessaging::{
        EnumWindows, GA_ROOTOWNER, GWL_EXSTYLE, GWL_STYLE, GetAncestor, GetLastActivePopup,
        GetShellWindow, GetTitleBarInfo, GetWindowLongW, GetWindowTextLengthW, IsIconic,
        IsWindowVisible, TITLEBARINFO, WS_DISABLED, WS_EX_TOOLWINDOW,
    };
    use windows::core::BOOL;

    use crate::error::{AppResult, CallContext};

    /*
     * Walks from the root owner through last active popups until a visible
     * one is found; a window is its own Alt+Tab entry when the walk ends on
     * it.
     */
    fn is_alt_tab_root(hwnd: HWND) -> bool {
        let mut walk = HWND::default();
        let mut candidate = unsafe { GetAncestor(hwnd, GA_ROOTOWNER) };
        while candidate != walk {
            walk = candidate;
            candidate = unsafe { GetLastActivePopup(walk) };
            if unsafe { IsWindowVisible(candidate) }.as_bool() {
                break;
            }
        }
        walk == hwnd
    }

    fn attributes_of(hwnd: HWND, shell: HWND) -> WindowAttributes {
        let mut cloaked = 0u32;
        let cloak_query = unsafe {
            DwmGetWindowAttribute(
                hwnd,
                DWMWA_CLOAKED,
                &mut cloaked as *mut u32 as *mut _,
                std::mem::size_of::<u32>() as u32,
            )
        };

        let mut title_bar = TITLEBARINFO {
            cbSize: std::mem::size_of::<TITLEBARINFO>() as u32,
            ..Default::default()
        };
        let title_bar_invisible = unsafe { GetTitleBarInfo(hwnd, &mut title_bar) }.is_ok()
            && title_bar.rgstate[0] & STATE_SYSTEM_INVISIBLE.0 != 0;

        let style = unsafe { GetWindowLongW(hwnd, GWL_STYLE) } as u32;
        let ex_style = unsafe { GetWindowLongW(hwnd, GWL_EXSTYLE) } as u32;

        WindowAttributes {
            visible: unsafe { IsWindowVisible(hwnd) }.as_bool(),
            is_alt_tab_root: is_alt_tab_root(hwnd),
            is_shell_window: hwnd == shell,
            disabled: style & WS_DISABLED.0 != 0,
            tool_window: ex_style & WS_EX_TOOLWINDOW.0 != 0,
            cloaked: cloak_query.is_ok() && cloaked != 0,
            has_title: unsafe { GetWindowTextLengthW(hwnd) } > 0,
            title_bar_invisible,
            iconic: unsafe { IsIconic(hwnd) }.as_bool(),
        }
    }

    unsafe extern "system" fn collect_window(hwnd: HWND, lparam: LPARAM) -> BOOL {
        if !hwnd.is_invalid() {
            let found = unsafe { &mut *(lparam.0 as *mut Vec<HWND>) };
            found.push(hwnd);
        }
        BOOL::from(true)
    }

    pub(crate) fn enumerate_tileable() -> AppResult<Vec<HWND>> {
        let mut all: Vec<HWND> = Vec::new();
        unsafe { EnumWindows(Some(collect_window), LPARAM(&mut all as *mut Vec<HWND> as isize)) }
            .call_context("EnumWindows")?;

        let shell = unsafe { GetShellWindow() };
        let selected = tileable(all.into_iter().map(|hwnd| (hwnd, attributes_of(hwnd, shell))));
        log::debug!("Tray: {} window(s) selected for tiling.", selected.len());
        Ok(selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinary_window_is_tileable() {
        assert!(WindowAttributes::default().is_tileable());
    }

    #[test]
    fn excludes_each_unwanted_kind() {
        // Arrange
        let normal = WindowAttributes::default();
        let excluded = [
            WindowAttributes { cloaked: true, ..normal },
            WindowAttributes { disabled: true, ..normal },
            WindowAttributes { tool_window: true, ..normal },
            WindowAttributes { visible: false, ..normal },
            WindowAttributes { iconic: true, ..normal },
            WindowAttributes { is_shell_window: true, ..normal },
            WindowAttributes { has_title: false, ..normal },
            WindowAttributes { is_alt_tab_root: false, ..normal },
            WindowAttributes { title_bar_invisible: true, ..normal },
        ];

        // Act / Assert
        for attributes in excluded {
            assert!(!attributes.is_tileable(), "{attributes:?} should be excluded");
        }
    }

    #[test]
    fn tileable_keeps_order_of_accepted_windows() {
        // Arrange
        let normal = WindowAttributes::default();
        let windows = vec![
            (1, normal),
            (2, WindowAttributes { iconic: true, ..normal }),
            (3, normal),
            (4, WindowAttributes { is_shell_window: true, ..normal }),
            (5, WindowAttributes { cloaked: true, tool_window: true, ..normal }),
        ];

        // Act
        let selected = tileable(windows);

        // Assert
        assert_eq!(selected, vec![1, 3]);
    }
}
