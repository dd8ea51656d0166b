pub mod items;

use crate::{ai::ModeKind, notify::Severity};

#[derive(Clone, Debug)]
pub struct ModeLine {
    pub label: &'static str,
    pub message: &'static str,
}

pub fn mode_lines() -> [ModeLine; 4] {
    [
        ModeLine {
            label: "Searching",
            message: "The shadow is feeling out its surroundings...",
        },
        ModeLine {
            label: "Active",
            message: "The shadow radiates killing intent and gives chase!",
        },
        ModeLine {
            label: "Drifting",
            message: "The shadow's presence has vanished completely...",
        },
        ModeLine {
            label: "Roaming",
            message: "The shadow seems to roam, looking for something.",
        },
    ]
}

pub fn mode_line(mode: ModeKind) -> ModeLine {
    let idx = match mode {
        ModeKind::Search => 0,
        ModeKind::Active => 1,
        ModeKind::WanderA => 2,
        ModeKind::WanderB => 3,
    };
    mode_lines()[idx].clone()
}

/// Entering `active` is the only mode change the host should treat as danger.
pub fn mode_severity(mode: ModeKind) -> Severity {
    match mode {
        ModeKind::Active => Severity::Danger,
        _ => Severity::Warning,
    }
}
