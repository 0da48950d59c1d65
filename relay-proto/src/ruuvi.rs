//! Ruuvi data format 5 ("RAWv2") decoding.
//!
//! Relayed advertisements carry the tag's manufacturer data unmodified, so the
//! host can decode it here. Layout (offsets into the manufacturer data, all
//! multi-byte fields big-endian):
//!
//! | Offset | Field |
//! |--------|-------|
//! | 0-1    | Company id `0x0499` (little-endian) |
//! | 2      | Data format (5) |
//! | 3-4    | Temperature, i16, 0.005 °C |
//! | 5-6    | Humidity, u16, 0.0025 % |
//! | 7-8    | Pressure, u16, Pa above 50 000 |
//! | 9-14   | Acceleration X/Y/Z, i16, mG |
//! | 15-16  | Battery (11 bits, mV above 1600) and TX power (5 bits) |
//! | 17     | Movement counter |
//! | 18-19  | Measurement sequence number |
//! | 20-25  | MAC address |
//!
//! Every field has a "not available" sentinel, decoded as `None`.

use crate::message::has_signature;

/// Length of a format 5 manufacturer data block.
pub const RAWV2_LEN: usize = 26;

/// Decoded Ruuvi format 5 measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RuuviReport {
    /// Temperature in degrees Celsius.
    pub temperature_c: Option<f32>,
    /// Relative humidity in percent.
    pub humidity_pct: Option<f32>,
    /// Air pressure in kPa.
    pub pressure_kpa: Option<f32>,
    /// Acceleration X/Y/Z in milli-g.
    pub acceleration_mg: [Option<i16>; 3],
    /// Battery voltage in volts.
    pub battery_v: Option<f32>,
    /// Transmit power in dBm.
    pub tx_power_dbm: Option<i8>,
    /// Movement counter (wraps at 254).
    pub movement_counter: Option<u8>,
    /// Measurement sequence number.
    pub sequence: Option<u16>,
    /// Tag MAC address.
    pub mac: [u8; 6],
}

#[inline]
fn be_i16(data: &[u8], at: usize) -> i16 {
    i16::from_be_bytes([data[at], data[at + 1]])
}

#[inline]
fn be_u16(data: &[u8], at: usize) -> u16 {
    u16::from_be_bytes([data[at], data[at + 1]])
}

#[inline]
fn available_i16(raw: i16) -> Option<i16> {
    (raw != i16::MIN).then_some(raw)
}

#[inline]
fn available_u16(raw: u16) -> Option<u16> {
    (raw != u16::MAX).then_some(raw)
}

impl RuuviReport {
    /// Decode format 5 manufacturer data.
    ///
    /// Returns `None` if the data is too short, does not carry the format 5
    /// signature, or has no MAC address (all `0xFF`).
    ///
    /// # Example
    ///
    /// ```
    /// use relay_proto::RuuviReport;
    ///
    /// let data = [
    ///     0x99, 0x04, 0x05, 0x12, 0xFC, 0x53, 0x94, 0xC3, 0x7C, 0x00, 0x04, 0xFF, 0xFC,
    ///     0x04, 0x0C, 0xAC, 0x36, 0x42, 0x00, 0xCD, 0xCB, 0xB8, 0x33, 0x4C, 0x88, 0x4F,
    /// ];
    /// let report = RuuviReport::parse(&data).unwrap();
    /// assert_eq!(report.sequence, Some(205));
    /// ```
    #[must_use]
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < RAWV2_LEN || !has_signature(data) {
            return None;
        }

        let mut mac = [0u8; 6];
        mac.copy_from_slice(&data[20..26]);
        if mac == [0xFF; 6] {
            return None;
        }

        let power = be_u16(data, 15);
        let battery_mv = power >> 5;
        let tx_power = (power & 0x1F) as u8;

        Some(Self {
            temperature_c: available_i16(be_i16(data, 3)).map(|t| f32::from(t) * 0.005),
            humidity_pct: available_u16(be_u16(data, 5)).map(|h| f32::from(h) * 0.0025),
            pressure_kpa: available_u16(be_u16(data, 7)).map(|p| f32::from(p) / 1000.0 + 50.0),
            acceleration_mg: [
                available_i16(be_i16(data, 9)),
                available_i16(be_i16(data, 11)),
                available_i16(be_i16(data, 13)),
            ],
            battery_v: (battery_mv != 2047).then(|| f32::from(battery_mv) / 1000.0 + 1.6),
            tx_power_dbm: (tx_power != 31).then(|| -40 + 2 * tx_power as i8),
            movement_counter: (data[17] != 0xFF).then_some(data[17]),
            sequence: available_u16(be_u16(data, 18)),
            mac,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: [u8; RAWV2_LEN] = [
        0x99, 0x04, 0x05, 0x12, 0xFC, 0x53, 0x94, 0xC3, 0x7C, 0x00, 0x04, 0xFF, 0xFC, 0x04, 0x0C,
        0xAC, 0x36, 0x42, 0x00, 0xCD, 0xCB, 0xB8, 0x33, 0x4C, 0x88, 0x4F,
    ];

    fn approx(actual: Option<f32>, expected: f32) -> bool {
        actual.is_some_and(|v| v - expected < 1e-3 && expected - v < 1e-3)
    }

    #[test]
    fn test_parse_valid_vector() {
        let report = RuuviReport::parse(&VALID).unwrap();
        assert!(approx(report.temperature_c, 24.3));
        assert!(approx(report.humidity_pct, 53.49));
        assert!(approx(report.pressure_kpa, 100.044));
        assert_eq!(report.acceleration_mg, [Some(4), Some(-4), Some(1036)]);
        assert!(approx(report.battery_v, 2.977));
        assert_eq!(report.tx_power_dbm, Some(4));
        assert_eq!(report.movement_counter, Some(66));
        assert_eq!(report.sequence, Some(205));
        assert_eq!(report.mac, [0xCB, 0xB8, 0x33, 0x4C, 0x88, 0x4F]);
    }

    #[test]
    fn test_parse_sentinels() {
        let mut data = VALID;
        data[3..5].copy_from_slice(&[0x80, 0x00]);
        data[5..7].copy_from_slice(&[0xFF, 0xFF]);
        data[7..9].copy_from_slice(&[0xFF, 0xFF]);
        data[9..11].copy_from_slice(&[0x80, 0x00]);
        data[15..17].copy_from_slice(&[0xFF, 0xFF]);
        data[17] = 0xFF;
        data[18..20].copy_from_slice(&[0xFF, 0xFF]);

        let report = RuuviReport::parse(&data).unwrap();
        assert_eq!(report.temperature_c, None);
        assert_eq!(report.humidity_pct, None);
        assert_eq!(report.pressure_kpa, None);
        assert_eq!(report.acceleration_mg[0], None);
        assert_eq!(report.battery_v, None);
        assert_eq!(report.tx_power_dbm, None);
        assert_eq!(report.movement_counter, None);
        assert_eq!(report.sequence, None);
    }

    #[test]
    fn test_parse_rejects_missing_mac() {
        let mut data = VALID;
        data[20..26].copy_from_slice(&[0xFF; 6]);
        assert_eq!(RuuviReport::parse(&data), None);
    }

    #[test]
    fn test_parse_rejects_short_or_foreign_data() {
        assert_eq!(RuuviReport::parse(&VALID[..RAWV2_LEN - 1]), None);

        let mut data = VALID;
        data[2] = 0x03;
        assert_eq!(RuuviReport::parse(&data), None);
    }

    #[test]
    fn test_parse_negative_temperature() {
        let mut data = VALID;
        // -1000 * 0.005 = -5.0 °C
        data[3..5].copy_from_slice(&(-1000i16).to_be_bytes());
        let report = RuuviReport::parse(&data).unwrap();
        assert!(approx(report.temperature_c, -5.0));
    }
}
