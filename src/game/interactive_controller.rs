//! Interactive controller for human players
//!
//! Prints a numbered menu of the offered actions and reads the choice from a
//! line-based input. `p` (or an empty line when passing is the only option)
//! passes priority.

use crate::game::actor::PriorityRequest;
use crate::game::controller::PlayerController;
use crate::game::PlayerAction;
use std::io::{self, BufRead, Write};

/// A controller that prompts a human for decisions
pub struct InteractiveController<R, W> {
    input: R,
    output: W,
}

impl InteractiveController<io::BufReader<io::Stdin>, io::Stdout> {
    /// Prompt on stdout, read from stdin
    pub fn stdio() -> Self {
        InteractiveController::new(io::BufReader::new(io::stdin()), io::stdout())
    }
}

impl<R: BufRead, W: Write> InteractiveController<R, W> {
    pub fn new(input: R, output: W) -> Self {
        InteractiveController { input, output }
    }

    fn show(&mut self, request: &PriorityRequest) -> io::Result<()> {
        let step = request
            .combat_step
            .map(|s| format!(" / {s}"))
            .unwrap_or_default();
        writeln!(
            self.output,
            "\n[Turn {}] {}{} - life {}",
            request.turn_number, request.phase, step, request.life
        )?;
        if !request.stack.is_empty() {
            writeln!(self.output, "Stack (top first): {}", request.stack.join(", "))?;
        }
        for (i, description) in request.descriptions.iter().enumerate() {
            writeln!(self.output, "  {i}: {description}")?;
        }
        write!(self.output, "Choice (number, or 'p' to pass): ")?;
        self.output.flush()
    }

    /// Read one valid menu index; `None` means pass or end of input
    fn read_choice(&mut self, options: usize) -> Option<usize> {
        loop {
            let mut line = String::new();
            match self.input.read_line(&mut line) {
                Ok(0) | Err(_) => return None,
                Ok(_) => {}
            }
            let trimmed = line.trim();
            if trimmed == "p" || trimmed == "pass" {
                return None;
            }
            match trimmed.parse::<usize>() {
                Ok(choice) if choice < options => return Some(choice),
                _ => {
                    let _ = write!(
                        self.output,
                        "Invalid choice. Enter 0-{} or 'p': ",
                        options.saturating_sub(1)
                    );
                    let _ = self.output.flush();
                }
            }
        }
    }
}

impl<R: BufRead + Send, W: Write + Send> PlayerController for InteractiveController<R, W> {
    fn choose_action(&mut self, request: &PriorityRequest) -> PlayerAction {
        if self.show(request).is_err() {
            return PlayerAction::pass();
        }
        self.read_choice(request.available_actions.len())
            .and_then(|i| request.available_actions.get(i).copied())
            .unwrap_or_else(PlayerAction::pass)
    }

    fn on_game_end(&mut self) {
        let _ = writeln!(self.output, "Game over.");
    }
}
