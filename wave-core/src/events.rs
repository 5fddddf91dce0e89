//! Recorded generation events and their on-disk format.
//!
//! File layout, all little-endian:
//!
//! ```text
//! u32 count
//! count × { f32 time, f32 x, f32 y }
//! ```
//!
//! There is no version field. A file written in any other layout is
//! rejected only if its length does not match the header.

use std::{fs, path::Path};

use glam::Vec2;

use crate::error::{Result, SimError};

const HEADER_LEN: usize = 4;
const RECORD_LEN: usize = 12;

/// One generation request: spawn a ring at `position` at `time`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GenEvent {
    pub time: f32,
    pub position: Vec2,
}

/// Ordered record of generation events.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EventLog {
    events: Vec<GenEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_events(events: Vec<GenEvent>) -> Self {
        Self { events }
    }

    /// Appends an event.
    pub fn record(&mut self, time: f32, position: Vec2) {
        self.events.push(GenEvent { time, position });
    }

    pub fn events(&self) -> &[GenEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Events ordered by time. Events with equal times keep their recorded
    /// order.
    pub fn sorted(&self) -> Vec<GenEvent> {
        let mut events = self.events.clone();
        events.sort_by(|a, b| a.time.total_cmp(&b.time));
        events
    }

    /// Encodes the log in the file layout.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN + RECORD_LEN * self.events.len());
        out.extend_from_slice(&(self.events.len() as u32).to_le_bytes());
        for ev in &self.events {
            out.extend_from_slice(&ev.time.to_le_bytes());
            out.extend_from_slice(&ev.position.x.to_le_bytes());
            out.extend_from_slice(&ev.position.y.to_le_bytes());
        }
        out
    }

    /// Decodes a log from the file layout.
    ///
    /// ### Errors
    /// [`SimError::Truncated`] if the buffer is shorter than the header or
    /// than the declared event count, [`SimError::TrailingBytes`] if it is
    /// longer.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let Some((header, body)) = bytes.split_first_chunk::<HEADER_LEN>() else {
            return Err(SimError::Truncated {
                declared: 0,
                available: bytes.len(),
            });
        };
        let declared = u32::from_le_bytes(*header);

        let expected = (declared as usize)
            .checked_mul(RECORD_LEN)
            .ok_or(SimError::Truncated {
                declared,
                available: body.len(),
            })?;
        if body.len() < expected {
            return Err(SimError::Truncated {
                declared,
                available: body.len(),
            });
        }
        if body.len() > expected {
            return Err(SimError::TrailingBytes(body.len() - expected));
        }

        let events = body
            .chunks_exact(RECORD_LEN)
            .map(|rec| {
                let f = |i: usize| f32::from_le_bytes([rec[i], rec[i + 1], rec[i + 2], rec[i + 3]]);
                GenEvent {
                    time: f(0),
                    position: Vec2::new(f(4), f(8)),
                }
            })
            .collect();

        Ok(Self { events })
    }

    /// Writes the whole log to `path`, replacing any existing file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.to_bytes())?;
        log::info!("saved {} events to {}", self.events.len(), path.display());
        Ok(())
    }

    /// Replaces this log with the content of `path`.
    ///
    /// The file is read and decoded completely before anything is replaced;
    /// on error this log is left exactly as it was. Returns the number of
    /// events loaded.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        let loaded = Self::from_bytes(&bytes)?;
        *self = loaded;
        log::info!("loaded {} events from {}", self.events.len(), path.display());
        Ok(self.events.len())
    }
}
