/*
 * Lookup table pairing each tray action with its "Left click does" radio
 * item and its display label. Built once from the tray menu definition and
 * owned by the tray controller.
 */
use crate::config::APP_NAME;
use crate::menu::{MenuEntry, find_label, plain_label};
use crate::types::CommandId;

/// Maximum tooltip length in UTF-16 units, excluding the terminator.
pub const TOOLTIP_MAX_UNITS: usize = 127;

#[derive(Debug, Clone, PartialEq, Eq)]
struct ActionRow {
    action: CommandId,
    default_item: CommandId,
    label: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionTable {
    rows: Vec<ActionRow>,
}

const PAIRS: [(CommandId, CommandId); 5] = [
    (CommandId::CascadeWindows, CommandId::DefaultCascadeWindows),
    (CommandId::ShowWindowsStacked, CommandId::DefaultShowWindowsStacked),
    (
        CommandId::ShowWindowsSideBySide,
        CommandId::DefaultShowWindowsSideBySide,
    ),
    (CommandId::ShowTheDesktop, CommandId::DefaultShowTheDesktop),
    (CommandId::UndoMinimize, CommandId::DefaultUndoMinimize),
];

impl ActionTable {
    pub fn from_menu(menu: &[MenuEntry]) -> Self {
        let rows = PAIRS
            .iter()
            .map(|&(action, default_item)| ActionRow {
                action,
                default_item,
                label: find_label(menu, action)
                    .map(plain_label)
                    .unwrap_or_else(|| format!("{action:?}")),
            })
            .collect();
        ActionTable { rows }
    }

    pub fn default_for_action(&self, action: CommandId) -> Option<CommandId> {
        self.rows
            .iter()
            .find(|row| row.action == action)
            .map(|row| row.default_item)
    }

    pub fn action_for_default(&self, default_item: CommandId) -> Option<CommandId> {
        self.rows
            .iter()
            .find(|row| row.default_item == default_item)
            .map(|row| row.action)
    }

    pub fn label_for(&self, action: CommandId) -> Option<&str> {
        self.rows
            .iter()
            .find(|row| row.action == action)
            .map(|row| row.label.as_str())
    }

    /// First and last ids of the radio group, for `CheckMenuRadioItem`.
    pub fn radio_range(&self) -> (CommandId, CommandId) {
        (
            CommandId::DefaultCascadeWindows,
            CommandId::DefaultUndoMinimize,
        )
    }

    pub fn tooltip_for(&self, action: CommandId) -> String {
        tooltip_text(self.label_for(action).unwrap_or_default())
    }
}

/*
 * Two-line tooltip naming the current left-click action, cut to what the
 * notification area accepts. The cut never splits a surrogate pair.
 */
pub fn tooltip_text(label: &str) -> String {
    let full = format!("{APP_NAME}\r\nLeft-click: {label}");
    let mut units = 0;
    let mut out = String::with_capacity(full.len());
    for c in full.chars() {
        units += c.len_utf16();
        if units > TOOLTIP_MAX_UNITS {
            break;
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::menu::tray_menu;

    #[test]
    fn actions_and_defaults_map_both_ways() {
        // Arrange
        let table = ActionTable::from_menu(&tray_menu());

        // Act / Assert
        for &(action, default_item) in &PAIRS {
            assert_eq!(table.default_for_action(action), Some(default_item));
            assert_eq!(table.action_for_default(default_item), Some(action));
        }
        assert_eq!(table.default_for_action(CommandId::Exit), None);
        assert_eq!(table.action_for_default(CommandId::SettingsLogging), None);
    }

    #[test]
    fn labels_come_from_menu_without_mnemonics() {
        let table = ActionTable::from_menu(&tray_menu());

        assert_eq!(
            table.label_for(CommandId::ShowWindowsStacked),
            Some("Show windows stacked")
        );
        assert_eq!(
            table.tooltip_for(CommandId::CascadeWindows),
            "Tile Cascade\r\nLeft-click: Cascade windows"
        );
    }

    #[test]
    fn missing_menu_entry_falls_back_to_command_name() {
        let table = ActionTable::from_menu(&[]);
        assert_eq!(table.label_for(CommandId::UndoMinimize), Some("UndoMinimize"));
    }

    #[test]
    fn radio_range_spans_the_five_default_items() {
        // Arrange
        let table = ActionTable::from_menu(&tray_menu());

        // Act
        let (first, last) = table.radio_range();

        // Assert
        assert_eq!(last.raw() - first.raw(), 4);
        for &(_, default_item) in &PAIRS {
            assert!((first.raw()..=last.raw()).contains(&default_item.raw()));
        }
    }

    #[test]
    fn long_tooltip_is_truncated_to_notification_limit() {
        // Arrange
        let label = "\u{1F5D4}".repeat(100);

        // Act
        let tip = tooltip_text(&label);

        // Assert
        assert!(tip.encode_utf16().count() <= TOOLTIP_MAX_UNITS);
        assert!(tip.starts_with("Tile Cascade\r\nLeft-click: "));
        assert!(tip.ends_with('\u{1F5D4}'));
    }
}
