use std::io::{self, BufRead, Write};
use std::path::Path;

use anyhow::Result;
use triad_core::{Stimulus, TaskPhase};

/// Messages between trials. Each waits for the participant before returning.
#[derive(Debug, Clone, PartialEq)]
pub enum Screen<'a> {
    Welcome,
    PracticeIntro { count: usize },
    PracticeDone,
    BlockStart { block: usize, count: usize },
    RestBreak,
    ChoiceTaskDone,
    DescriptorIntro { count: usize },
    Finished { output: Option<&'a Path> },
}

/// Display and input side of the experiment. `None` from a prompt means
/// the participant ended the session.
pub trait Presenter {
    fn announce(&mut self, screen: Screen<'_>) -> Result<()>;

    /// Zero-based position of the item picked as the odd one out.
    fn choose(&mut self, phase: TaskPhase, items: &[Stimulus]) -> Result<Option<usize>>;

    fn describe(&mut self, stimulus: &Stimulus) -> Result<Option<String>>;

    /// The last answer was not accepted; the same trial will be asked again.
    fn reject(&mut self, reason: &str) -> Result<()>;
}

/// Line-oriented presenter: items are listed by identifier and path and the
/// participant types a number or a word.
pub struct TerminalPresenter<R, W> {
    input: R,
    output: W,
}

impl TerminalPresenter<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> TerminalPresenter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    fn read_line(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    fn pause(&mut self, text: &str) -> Result<()> {
        writeln!(self.output, "\n{text}")?;
        writeln!(self.output, "Press Enter to continue.")?;
        self.output.flush()?;
        self.read_line()?;
        Ok(())
    }
}

impl<R: BufRead, W: Write> Presenter for TerminalPresenter<R, W> {
    fn announce(&mut self, screen: Screen<'_>) -> Result<()> {
        match screen {
            Screen::Welcome => self.pause(
                "Welcome! This experiment has two tasks.\n\
                 In the first, three images are shown at a time: pick the one most different from the other two.\n\
                 In the second, describe each image in a word or short phrase.",
            ),
            Screen::PracticeIntro { count } => self.pause(&format!(
                "You will start with {count} practice trials. They are not recorded."
            )),
            Screen::PracticeDone => self.pause("Practice is over. The main task starts now."),
            Screen::BlockStart { block, count } => {
                self.pause(&format!("Block {} of {count} starts now.", block + 1))
            }
            Screen::RestBreak => {
                self.pause("Take a couple of minutes to rest if needed. Continue when you are ready.")
            }
            Screen::ChoiceTaskDone => self.pause("Task 1 is complete. Thank you!"),
            Screen::DescriptorIntro { count } => self.pause(&format!(
                "Task 2: for each of the {count} images, type a word that describes it."
            )),
            Screen::Finished { output } => {
                match output {
                    Some(path) => writeln!(
                        self.output,
                        "\nThank you! All data saved to {}",
                        path.display()
                    )?,
                    None => writeln!(self.output, "\nThank you!")?,
                }
                self.output.flush()?;
                Ok(())
            }
        }
    }

    fn choose(&mut self, phase: TaskPhase, items: &[Stimulus]) -> Result<Option<usize>> {
        if phase == TaskPhase::Practice {
            writeln!(self.output, "\n[practice]")?;
        } else {
            writeln!(self.output)?;
        }
        writeln!(self.output, "Which one is most different from the others?")?;
        for (i, stim) in items.iter().enumerate() {
            writeln!(self.output, "  {}) {} ({})", i + 1, stim.id(), stim.path().display())?;
        }
        loop {
            write!(self.output, "> ")?;
            self.output.flush()?;
            let Some(line) = self.read_line()? else {
                return Ok(None);
            };
            match line.trim().parse::<usize>() {
                Ok(n) if n >= 1 => return Ok(Some(n - 1)),
                _ => writeln!(self.output, "Type the number of an item.")?,
            }
        }
    }

    fn describe(&mut self, stimulus: &Stimulus) -> Result<Option<String>> {
        writeln!(
            self.output,
            "\n{} ({})",
            stimulus.id(),
            stimulus.path().display()
        )?;
        write!(self.output, "Describe this image, then press Enter: ")?;
        self.output.flush()?;
        self.read_line()
    }

    fn reject(&mut self, reason: &str) -> Result<()> {
        writeln!(self.output, "{reason}")?;
        Ok(())
    }
}
