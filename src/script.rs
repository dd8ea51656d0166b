use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::Path,
};

use crate::{encounter::EncounterChoice, turn::Intent};

/// One scripted keypress, already mapped to what it means.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Step { dx: i32, dy: i32 },
    Interact,
    Use { slot: usize },
    Dodge,
    Quit,
}

impl Command {
    /// The turn intent this command stands for, if it is one.
    pub fn intent(self) -> Option<Intent> {
        match self {
            Command::Step { dx, dy } => Some(Intent::Move { dx, dy }),
            Command::Interact => Some(Intent::Interact),
            Command::Use { slot } => Some(Intent::UseItem { slot }),
            Command::Dodge | Command::Quit => None,
        }
    }

    /// The encounter choice this command stands for, if it is one.
    pub fn encounter_choice(self) -> Option<EncounterChoice> {
        match self {
            Command::Dodge => Some(EncounterChoice::Dodge),
            Command::Use { slot } => Some(EncounterChoice::UseItem { slot }),
            Command::Step { .. } | Command::Interact | Command::Quit => None,
        }
    }
}

pub struct Script {
    commands: Vec<Command>,
    cursor: usize,
}

impl Script {
    pub fn from_file<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let mut lines = Vec::new();
        for line in reader.lines() {
            lines.push(line?);
        }
        Ok(Self::parse(lines.iter().map(String::as_str)))
    }

    pub fn from_text(text: &str) -> Self {
        Self::parse(text.lines())
    }

    /// Every character of every non-comment line is one keypress.
    fn parse<'a>(lines: impl Iterator<Item = &'a str>) -> Self {
        let mut commands = Vec::new();
        for line in lines {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            for key in trimmed.chars() {
                match key_to_command(key) {
                    Some(command) => commands.push(command),
                    None if key.is_whitespace() => {}
                    None => log::warn!("unknown key in script: {key:?}"),
                }
            }
        }
        Self {
            commands,
            cursor: 0,
        }
    }

    pub fn next_command(&mut self) -> Option<Command> {
        let command = self.commands.get(self.cursor).copied()?;
        self.cursor += 1;
        Some(command)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

fn key_to_command(key: char) -> Option<Command> {
    match key {
        'w' | 'W' | 'k' | 'K' => Some(Command::Step { dx: 0, dy: -1 }),
        's' | 'S' | 'j' | 'J' => Some(Command::Step { dx: 0, dy: 1 }),
        'a' | 'A' | 'h' | 'H' => Some(Command::Step { dx: -1, dy: 0 }),
        'd' | 'D' | 'l' | 'L' => Some(Command::Step { dx: 1, dy: 0 }),
        'e' | 'E' | '.' | '>' => Some(Command::Interact),
        'r' | 'R' => Some(Command::Dodge),
        '1'..='9' => key
            .to_digit(10)
            .map(|digit| Command::Use {
                slot: digit as usize - 1,
            }),
        '0' => Some(Command::Use { slot: 9 }),
        'q' | 'Q' | '\x1B' => Some(Command::Quit),
        _ => None,
    }
}
