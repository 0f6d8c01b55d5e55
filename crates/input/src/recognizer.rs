use crate::event::{DragEvent, InputEvent, PinchEvent, WheelEvent};
use glam::Vec2;
use solidview_common::SurfaceId;
use std::collections::BTreeMap;

/// Raw pointer sample as delivered by a windowing library. Mouse buttons and
/// touch points are both contacts, distinguished by `id`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerSample {
    Down { id: u64, position: Vec2 },
    Move { id: u64, position: Vec2 },
    Up { id: u64 },
    Cancel { id: u64 },
    /// Scroll amount in pixels, positive `y` scrolling down.
    Wheel { delta: Vec2 },
}

/// Turns raw pointer samples into drag, pinch and wheel events.
///
/// Drag deltas follow the centroid of all contacts; the pinch delta is the
/// change in distance between exactly two contacts.
#[derive(Debug, Clone)]
pub struct GestureRecognizer {
    target: SurfaceId,
    contacts: BTreeMap<u64, Vec2>,
    spread: Option<f32>,
}

impl GestureRecognizer {
    pub fn new(target: SurfaceId) -> Self {
        Self {
            target,
            contacts: BTreeMap::new(),
            spread: None,
        }
    }

    pub fn target(&self) -> SurfaceId {
        self.target
    }

    pub fn contact_count(&self) -> usize {
        self.contacts.len()
    }

    pub fn feed(&mut self, sample: PointerSample) -> Vec<InputEvent> {
        match sample {
            PointerSample::Down { id, position } => {
                self.contacts.insert(id, position);
                self.spread = self.current_spread();
                vec![self.drag(true, Vec2::ZERO)]
            }
            PointerSample::Move { id, position } => {
                let before = self.centroid();
                match self.contacts.get_mut(&id) {
                    Some(contact) => *contact = position,
                    // Hover without a pressed contact.
                    None => return Vec::new(),
                }
                let delta = self.centroid() - before;

                let mut events = vec![self.drag(true, delta)];
                if let (Some(previous), Some(current)) = (self.spread, self.current_spread()) {
                    events.push(InputEvent::Pinch(PinchEvent {
                        target: self.target,
                        touches: 2,
                        delta: Vec2::new(current - previous, 0.0),
                    }));
                    self.spread = Some(current);
                }
                events
            }
            PointerSample::Up { id } | PointerSample::Cancel { id } => {
                if self.contacts.remove(&id).is_none() {
                    return Vec::new();
                }
                self.spread = self.current_spread();
                vec![self.drag(!self.contacts.is_empty(), Vec2::ZERO)]
            }
            PointerSample::Wheel { delta } => vec![InputEvent::Wheel(WheelEvent {
                target: self.target,
                delta,
            })],
        }
    }

    fn drag(&self, down: bool, delta: Vec2) -> InputEvent {
        InputEvent::Drag(DragEvent {
            target: self.target,
            down,
            touches: self.contacts.len().min(u8::MAX as usize) as u8,
            delta,
        })
    }

    fn centroid(&self) -> Vec2 {
        if self.contacts.is_empty() {
            return Vec2::ZERO;
        }
        self.contacts.values().copied().sum::<Vec2>() / self.contacts.len() as f32
    }

    fn current_spread(&self) -> Option<f32> {
        if self.contacts.len() != 2 {
            return None;
        }
        let mut points = self.contacts.values();
        let a = points.next()?;
        let b = points.next()?;
        Some(a.distance(*b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drag_of(event: &InputEvent) -> DragEvent {
        match event {
            InputEvent::Drag(d) => *d,
            other => panic!("expected drag, got {other:?}"),
        }
    }

    #[test]
    fn mouse_drag_reports_incremental_delta() {
        let mut r = GestureRecognizer::new(SurfaceId::new());
        r.feed(PointerSample::Down {
            id: 0,
            position: Vec2::new(10.0, 10.0),
        });
        let events = r.feed(PointerSample::Move {
            id: 0,
            position: Vec2::new(13.0, 14.0),
        });
        let d = drag_of(&events[0]);
        assert!(d.down);
        assert_eq!(d.touches, 1);
        assert_eq!(d.delta, Vec2::new(3.0, 4.0));

        let events = r.feed(PointerSample::Up { id: 0 });
        assert!(!drag_of(&events[0]).down);
        assert_eq!(r.contact_count(), 0);
    }

    #[test]
    fn hover_moves_are_ignored() {
        let mut r = GestureRecognizer::new(SurfaceId::new());
        assert!(
            r.feed(PointerSample::Move {
                id: 0,
                position: Vec2::ONE,
            })
            .is_empty()
        );
        assert!(r.feed(PointerSample::Up { id: 0 }).is_empty());
    }

    #[test]
    fn two_fingers_spreading_emit_pinch() {
        let mut r = GestureRecognizer::new(SurfaceId::new());
        r.feed(PointerSample::Down {
            id: 1,
            position: Vec2::new(0.0, 0.0),
        });
        r.feed(PointerSample::Down {
            id: 2,
            position: Vec2::new(10.0, 0.0),
        });
        let events = r.feed(PointerSample::Move {
            id: 2,
            position: Vec2::new(16.0, 0.0),
        });
        assert_eq!(drag_of(&events[0]).touches, 2);
        match events[1] {
            InputEvent::Pinch(p) => {
                assert_eq!(p.touches, 2);
                assert!((p.delta.x - 6.0).abs() < 1e-5);
            }
            other => panic!("expected pinch, got {other:?}"),
        }
    }

    #[test]
    fn three_contacts_drag_centroid() {
        let mut r = GestureRecognizer::new(SurfaceId::new());
        for id in 0..3 {
            r.feed(PointerSample::Down {
                id,
                position: Vec2::new(id as f32, 0.0),
            });
        }
        let events = r.feed(PointerSample::Move {
            id: 0,
            position: Vec2::new(3.0, 3.0),
        });
        assert_eq!(events.len(), 1);
        let d = drag_of(&events[0]);
        assert_eq!(d.touches, 3);
        assert!(d.delta.abs_diff_eq(Vec2::new(1.0, 1.0), 1e-5));
    }

    #[test]
    fn wheel_passes_through() {
        let id = SurfaceId::new();
        let mut r = GestureRecognizer::new(id);
        let events = r.feed(PointerSample::Wheel {
            delta: Vec2::new(0.0, 53.0),
        });
        assert_eq!(
            events,
            vec![InputEvent::Wheel(WheelEvent {
                target: id,
                delta: Vec2::new(0.0, 53.0),
            })]
        );
    }
}
