use serde::{Deserialize, Serialize};

use crate::academics::SectionId;

/// Occupancy of one section: its own capacity and current REGISTERED count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionLoad {
    pub section_id: SectionId,
    pub capacity: u32,
    pub load: u32,
}

impl SectionLoad {
    pub fn has_room(&self) -> bool {
        self.load < self.capacity
    }
}

/// Aggregate occupancy of a course across all of its sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseLoad {
    /// Sum of section capacities; zero means the course has no cap.
    pub capacity: i64,
    pub enrolled: i64,
}

impl CourseLoad {
    pub fn is_unlimited(&self) -> bool {
        self.capacity <= 0
    }

    pub fn is_full(&self) -> bool {
        !self.is_unlimited() && self.enrolled >= self.capacity
    }

    pub fn seats_remaining(&self) -> Option<i64> {
        if self.is_unlimited() {
            None
        } else {
            Some((self.capacity - self.enrolled).max(0))
        }
    }
}

/// Pick the least-loaded section that still has room, breaking ties by lowest id.
pub fn choose_section(sections: &[SectionLoad]) -> Option<SectionId> {
    let mut ordered: Vec<&SectionLoad> = sections.iter().collect();
    ordered.sort_by_key(|section| (section.load, section.section_id));
    ordered
        .into_iter()
        .find(|section| section.has_room())
        .map(|section| section.section_id)
}
