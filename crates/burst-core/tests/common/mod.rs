// Recording audio backend shared by the integration suites.
#![allow(dead_code)]

use burst_core::{AudioBackend, BackendState, Bus, Envelope, SoundEvent};
use std::cell::RefCell;
use std::future::{ready, Ready};
use std::rc::Rc;

pub struct MockState {
    pub state: BackendState,
    pub time: f64,
    pub allow_resume: bool,
    pub resume_requests: usize,
    pub scheduled: Vec<SoundEvent>,
    /// Stage generation each scheduled event was attached to.
    pub generations: Vec<u32>,
    pub generation: u32,
    /// Per retired generation: the time its stages are cut.
    pub cuts: Vec<f64>,
    pub automations: Vec<(Bus, Envelope)>,
}

/// Cloneable handle: the synthesizer owns one clone, the test keeps another.
#[derive(Clone)]
pub struct MockBackend(pub Rc<RefCell<MockState>>);

impl MockBackend {
    fn with_state(state: BackendState, allow_resume: bool) -> Self {
        Self(Rc::new(RefCell::new(MockState {
            state,
            time: 0.0,
            allow_resume,
            resume_requests: 0,
            scheduled: Vec::new(),
            generations: Vec::new(),
            generation: 0,
            cuts: Vec::new(),
            automations: Vec::new(),
        })))
    }

    pub fn running() -> Self {
        Self::with_state(BackendState::Running, true)
    }

    pub fn suspended(allow_resume: bool) -> Self {
        Self::with_state(BackendState::Suspended, allow_resume)
    }

    pub fn set_time(&self, t: f64) {
        self.0.borrow_mut().time = t;
    }

    pub fn advance(&self, dt: f64) {
        self.0.borrow_mut().time += dt;
    }

    pub fn now(&self) -> f64 {
        self.0.borrow().time
    }

    pub fn scheduled(&self) -> Vec<SoundEvent> {
        self.0.borrow().scheduled.clone()
    }

    pub fn scheduled_len(&self) -> usize {
        self.0.borrow().scheduled.len()
    }

    pub fn set_allow_resume(&self, allow: bool) {
        self.0.borrow_mut().allow_resume = allow;
    }

    /// Events still sounding at `t`: inside their start/stop window and on a
    /// stage that has not been cut yet.
    pub fn sounding_at(&self, t: f64) -> Vec<SoundEvent> {
        let s = self.0.borrow();
        s.scheduled
            .iter()
            .zip(&s.generations)
            .filter(|(ev, gen)| {
                let cut = s.cuts.get(**gen as usize).is_some_and(|c| *c <= t);
                ev.start <= t && t < ev.end_time() && !cut
            })
            .map(|(ev, _)| ev.clone())
            .collect()
    }

    pub fn resume_requests(&self) -> usize {
        self.0.borrow().resume_requests
    }

    pub fn last_automation(&self, bus: Bus) -> Option<Envelope> {
        self.0
            .borrow()
            .automations
            .iter()
            .rev()
            .find(|(b, _)| *b == bus)
            .map(|(_, e)| e.clone())
    }
}

impl AudioBackend for MockBackend {
    type Resume = Ready<bool>;

    fn state(&self) -> BackendState {
        self.0.borrow().state
    }

    fn current_time(&self) -> f64 {
        self.0.borrow().time
    }

    fn sample_rate(&self) -> f32 {
        48_000.0
    }

    fn request_resume(&self) -> Ready<bool> {
        let mut s = self.0.borrow_mut();
        s.resume_requests += 1;
        if s.allow_resume {
            s.state = BackendState::Running;
        }
        ready(s.allow_resume)
    }

    fn schedule(&mut self, event: &SoundEvent) {
        let mut s = self.0.borrow_mut();
        let gen = s.generation;
        s.scheduled.push(event.clone());
        s.generations.push(gen);
    }

    fn retire_voices(&mut self, at: f64, fade: f64, _floor: f32) {
        let mut s = self.0.borrow_mut();
        s.cuts.push(at + fade);
        s.generation += 1;
    }

    fn automate(&mut self, bus: Bus, automation: &Envelope) {
        self.0.borrow_mut().automations.push((bus, automation.clone()));
    }
}
