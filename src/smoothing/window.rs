use crate::emotion::Detection;
use std::collections::VecDeque;

/// Fixed-capacity FIFO of detections. The oldest entry is dropped first.
#[derive(Debug, Clone)]
pub struct DetectionWindow {
    capacity: usize,
    detections: VecDeque<Detection>,
}

impl DetectionWindow {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "Window size must be greater than 0");
        Self {
            capacity,
            detections: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, detection: Detection) {
        while self.detections.len() >= self.capacity {
            self.detections.pop_front();
        }
        self.detections.push_back(detection);
    }

    pub fn resize(&mut self, capacity: usize) {
        assert!(capacity > 0, "Window size must be greater than 0");
        self.capacity = capacity;
        while self.detections.len() > capacity {
            self.detections.pop_front();
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.detections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }

    pub fn clear(&mut self) {
        self.detections.clear();
    }

    /// Oldest first
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Detection> {
        self.detections.iter()
    }
}
