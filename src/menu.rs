/*
 * Declarative menu definitions for the tray context menu and the log
 * viewer's menu bar. The Win32 side turns these into native menus
 * (`window_common::build_popup_menu`), attaching each submenu's tag so the
 * "menu about to open" handlers can find it again without positions.
 */
use crate::types::{CommandId, MenuTag};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuEntry {
    Command { id: CommandId, label: &'static str },
    Separator,
    Submenu {
        label: &'static str,
        tag: MenuTag,
        items: Vec<MenuEntry>,
    },
}

fn command(id: CommandId, label: &'static str) -> MenuEntry {
    MenuEntry::Command { id, label }
}

fn submenu(label: &'static str, tag: MenuTag, items: Vec<MenuEntry>) -> MenuEntry {
    MenuEntry::Submenu { label, tag, items }
}

pub fn tray_menu() -> Vec<MenuEntry> {
    vec![
        command(CommandId::CascadeWindows, "&Cascade windows"),
        command(CommandId::ShowWindowsStacked, "Show windows stac&ked"),
        command(CommandId::ShowWindowsSideBySide, "Show windows side by s&ide"),
        command(CommandId::ShowTheDesktop, "Show the &desktop"),
        command(CommandId::UndoMinimize, "&Undo minimize"),
        MenuEntry::Separator,
        submenu(
            "&Settings",
            MenuTag::TraySettings,
            vec![
                submenu(
                    "&Left click does",
                    MenuTag::TrayLeftClickDoes,
                    vec![
                        command(CommandId::DefaultCascadeWindows, "&Cascade windows"),
                        command(CommandId::DefaultShowWindowsStacked, "Show windows stac&ked"),
                        command(
                            CommandId::DefaultShowWindowsSideBySide,
                            "Show windows side by s&ide",
                        ),
                        command(CommandId::DefaultShowTheDesktop, "Show the &desktop"),
                        command(CommandId::DefaultUndoMinimize, "&Undo minimize"),
                    ],
                ),
                MenuEntry::Separator,
                command(CommandId::SettingsAutoStart, "Start &automatically"),
                command(CommandId::SettingsLogging, "&Logging"),
                command(
                    CommandId::SettingsDefaultTiling,
                    "Default &Windows tile/cascade",
                ),
                command(CommandId::SettingsOpenLogFile, "&Open log file"),
            ],
        ),
        MenuEntry::Separator,
        command(CommandId::Exit, "E&xit"),
    ]
}

pub fn viewer_menu_bar() -> Vec<MenuEntry> {
    vec![
        submenu(
            "&File",
            MenuTag::ViewerFile,
            vec![
                command(CommandId::ViewerReload, "&Reload\tF5"),
                MenuEntry::Separator,
                command(CommandId::ViewerClose, "&Close"),
            ],
        ),
        submenu(
            "&Edit",
            MenuTag::ViewerEdit,
            vec![
                command(CommandId::EditCopy, "&Copy\tCtrl+C"),
                command(CommandId::EditSelectAll, "Select &all\tCtrl+A"),
                MenuEntry::Separator,
                command(CommandId::EditFind, "&Find...\tCtrl+F"),
                command(CommandId::EditFindNext, "Find &next\tF3"),
                command(CommandId::EditFindPrevious, "Find &previous\tShift+F3"),
                command(CommandId::EditGoto, "&Go to...\tCtrl+G"),
            ],
        ),
        submenu(
            "&View",
            MenuTag::ViewerView,
            vec![
                command(CommandId::ViewLineNumbers, "&Line numbers"),
                command(CommandId::ViewStatusBar, "&Status bar"),
            ],
        ),
        submenu(
            "&Zoom",
            MenuTag::ViewerZoom,
            vec![
                command(CommandId::ZoomIn, "Zoom &in\tCtrl+Plus"),
                command(CommandId::ZoomOut, "Zoom &out\tCtrl+Minus"),
            ],
        ),
    ]
}

/*
 * Display form of a menu label: mnemonic markers removed ("&&" stays a
 * literal ampersand) and any accelerator hint after a tab dropped.
 */
pub fn plain_label(label: &str) -> String {
    let visible = label.split('\t').next().unwrap_or_default();
    let mut out = String::with_capacity(visible.len());
    let mut chars = visible.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '&' {
            if chars.peek() == Some(&'&') {
                out.push('&');
                chars.next();
            }
            continue;
        }
        out.push(c);
    }
    out
}

/// Depth-first search for the label of `id` in a menu definition.
pub fn find_label(entries: &[MenuEntry], id: CommandId) -> Option<&'static str> {
    entries.iter().find_map(|entry| match entry {
        MenuEntry::Command { id: candidate, label } if *candidate == id => Some(*label),
        MenuEntry::Submenu { items, .. } => find_label(items, id),
        _ => None,
    })
}
