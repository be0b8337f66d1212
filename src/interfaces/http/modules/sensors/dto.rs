//! Sensor feed DTOs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::application::SensorReading;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
pub struct SensorReadingDto {
    pub slot_id: i32,
    pub occupied: bool,
}

impl From<SensorReadingDto> for SensorReading {
    fn from(r: SensorReadingDto) -> Self {
        SensorReading {
            slot_id: r.slot_id,
            occupied: r.occupied,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SensorReadingsRequest {
    #[validate(length(min = 1, max = 1000))]
    pub readings: Vec<SensorReadingDto>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SensorIngestResponse {
    /// Slots that started a new session
    pub occupied: usize,
}
