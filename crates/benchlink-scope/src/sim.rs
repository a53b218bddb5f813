//! In-memory capture board for testing
//!
//! Emulates a scope with a target whose flash holds one image. Programming
//! stores the image file's contents; when nRST is released the simulated
//! firmware "prints" those contents, served a few characters per read so
//! the session layer sees partial reads.
//!
//! [`SimBoard::target`] and [`SimBoard::programmer`] hand out handles that
//! share the same board, like a real scope connection shared by the target
//! and programmer objects.

use crate::device::{NrstLevel, ScopeProgrammer, ScopeTarget};
use crate::error::{ProgrammerStep, Result, ScopeError};
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Characters returned per target read by default
pub const DEFAULT_CHUNK: usize = 16;

/// Something the board was asked to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimEvent {
    /// A programmer step ran (successfully or not)
    Programmer(ProgrammerStep),
    /// The target buffer was flushed
    Flush,
    /// nRST was driven
    Nrst(NrstLevel),
    /// The target connection was closed
    TargetClosed,
}

#[derive(Debug)]
struct SimState {
    flash: Option<Vec<u8>>,
    programmed_from: Option<PathBuf>,
    uart: String,
    nrst: NrstLevel,
    bootloader_open: bool,
    target_closed: bool,
    fail_at: Option<ProgrammerStep>,
    chunk: usize,
    events: Vec<SimEvent>,
}

/// Simulated capture board
#[derive(Clone)]
pub struct SimBoard {
    state: Rc<RefCell<SimState>>,
}

impl Default for SimBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl SimBoard {
    /// Create a board with erased flash and the target held out of reset
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(SimState {
                flash: None,
                programmed_from: None,
                uart: String::new(),
                nrst: NrstLevel::High,
                bootloader_open: false,
                target_closed: false,
                fail_at: None,
                chunk: DEFAULT_CHUNK,
                events: Vec::new(),
            })),
        }
    }

    /// Serve at most `chunk` characters per target read
    pub fn with_chunk(self, chunk: usize) -> Self {
        self.state.borrow_mut().chunk = chunk.max(1);
        self
    }

    /// Make the given programmer step fail
    pub fn failing_at(self, step: ProgrammerStep) -> Self {
        self.state.borrow_mut().fail_at = Some(step);
        self
    }

    /// Queue text on the target UART as if the running firmware sent it
    pub fn emit(&self, text: &str) {
        self.state.borrow_mut().uart.push_str(text);
    }

    /// Target handle
    pub fn target(&self) -> SimTarget {
        SimTarget {
            state: Rc::clone(&self.state),
        }
    }

    /// Programmer handle
    pub fn programmer(&self) -> SimProgrammer {
        SimProgrammer {
            state: Rc::clone(&self.state),
        }
    }

    /// Everything the board was asked to do so far
    pub fn events(&self) -> Vec<SimEvent> {
        self.state.borrow().events.clone()
    }

    /// Path of the last image written to flash
    pub fn programmed_from(&self) -> Option<PathBuf> {
        self.state.borrow().programmed_from.clone()
    }

    /// Whether the programmer is currently connected
    pub fn is_bootloader_open(&self) -> bool {
        self.state.borrow().bootloader_open
    }

    /// Whether the target connection was closed
    pub fn is_target_closed(&self) -> bool {
        self.state.borrow().target_closed
    }
}

/// Target side of a [`SimBoard`]
pub struct SimTarget {
    state: Rc<RefCell<SimState>>,
}

impl ScopeTarget for SimTarget {
    fn read(&mut self) -> Result<String> {
        let mut state = self.state.borrow_mut();
        if state.target_closed {
            return Err(ScopeError::TargetClosed);
        }
        let split = state
            .uart
            .char_indices()
            .nth(state.chunk)
            .map_or(state.uart.len(), |(i, _)| i);
        let rest = state.uart.split_off(split);
        Ok(std::mem::replace(&mut state.uart, rest))
    }

    fn flush(&mut self) -> Result<()> {
        let mut state = self.state.borrow_mut();
        if state.target_closed {
            return Err(ScopeError::TargetClosed);
        }
        state.events.push(SimEvent::Flush);
        state.uart.clear();
        Ok(())
    }

    fn set_nrst(&mut self, level: NrstLevel) -> Result<()> {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        if state.target_closed {
            return Err(ScopeError::TargetClosed);
        }
        state.events.push(SimEvent::Nrst(level));
        match (state.nrst, level) {
            (_, NrstLevel::Low) => state.uart.clear(),
            (NrstLevel::Low, NrstLevel::High) => {
                // Firmware boots and prints its output
                if let Some(image) = &state.flash {
                    let output = String::from_utf8_lossy(image).into_owned();
                    state.uart.push_str(&output);
                }
            }
            (NrstLevel::High, NrstLevel::High) => {}
        }
        state.nrst = level;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.events.push(SimEvent::TargetClosed);
        state.target_closed = true;
        Ok(())
    }
}

/// Programmer side of a [`SimBoard`]
pub struct SimProgrammer {
    state: Rc<RefCell<SimState>>,
}

impl SimProgrammer {
    /// Record `step` and apply the configured failure
    fn step(&self, step: ProgrammerStep) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.events.push(SimEvent::Programmer(step));
        if state.fail_at == Some(step) {
            return Err(ScopeError::Step {
                step,
                reason: "no response from bootloader".to_string(),
            });
        }
        if step != ProgrammerStep::Open && !state.bootloader_open {
            return Err(ScopeError::NotOpen);
        }
        Ok(())
    }
}

impl ScopeProgrammer for SimProgrammer {
    fn open(&mut self) -> Result<()> {
        self.step(ProgrammerStep::Open)?;
        self.state.borrow_mut().bootloader_open = true;
        Ok(())
    }

    fn find(&mut self) -> Result<()> {
        self.step(ProgrammerStep::Find)
    }

    fn erase(&mut self) -> Result<()> {
        self.step(ProgrammerStep::Erase)?;
        self.state.borrow_mut().flash = None;
        Ok(())
    }

    fn program(&mut self, image: &Path, _verify: bool) -> Result<()> {
        self.step(ProgrammerStep::Program)?;
        let contents = std::fs::read(image)?;
        let mut state = self.state.borrow_mut();
        state.flash = Some(contents);
        state.programmed_from = Some(image.to_path_buf());
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.events.push(SimEvent::Programmer(ProgrammerStep::Close));
        state.bootloader_open = false;
        if state.fail_at == Some(ProgrammerStep::Close) {
            return Err(ScopeError::Step {
                step: ProgrammerStep::Close,
                reason: "no response from bootloader".to_string(),
            });
        }
        Ok(())
    }
}
