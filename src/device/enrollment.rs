//! Person Enrollment and Biometric Registration
//!
//! Builds enrollment payloads (blank optional fields never reach the
//! wire), prepares face photos for the middleware's request-size
//! ceiling, dispatches biometric registration by kind, and filters the
//! person list down to those still missing a given biometric.

use super::DeviceClient;
use crate::error::{ClientError, ClientResult};
use crate::model::Person;
use base64::Engine;
use futures_util::future::join_all;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use serde::Serialize;
use uuid::Uuid;

/// Longest allowed photo dimension after downscaling.
pub const MAX_PHOTO_DIMENSION: u32 = 800;
/// JPEG re-encode quality.
pub const JPEG_QUALITY: u8 = 80;
/// Size ceiling for the encoded photo; larger photos are dropped.
pub const MAX_PHOTO_BYTES: usize = 1_500_000;

/// Enrollment payload for a new person. Construct with [`NewPerson::new`];
/// optional setters ignore blank input so the serialized body contains
/// only fields that were actually provided.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPerson {
    person_sn: String,
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    id_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    face_image: Option<String>,
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

impl NewPerson {
    /// Both identifiers are required and validated after trimming.
    pub fn new(person_sn: &str, name: &str) -> ClientResult<Self> {
        let person_sn = non_blank(person_sn)
            .ok_or_else(|| ClientError::Validation("person SN must not be empty".to_string()))?;
        let name = non_blank(name)
            .ok_or_else(|| ClientError::Validation("name must not be empty".to_string()))?;

        Ok(Self {
            person_sn,
            name,
            phone: None,
            gender: None,
            department: None,
            id_number: None,
            pin: None,
            face_image: None,
        })
    }

    pub fn person_sn(&self) -> &str {
        &self.person_sn
    }

    pub fn phone(mut self, value: &str) -> Self {
        self.phone = non_blank(value);
        self
    }

    pub fn gender(mut self, value: &str) -> Self {
        self.gender = non_blank(value);
        self
    }

    pub fn department(mut self, value: &str) -> Self {
        self.department = non_blank(value);
        self
    }

    pub fn id_number(mut self, value: &str) -> Self {
        self.id_number = non_blank(value);
        self
    }

    pub fn pin(mut self, value: &str) -> Self {
        self.pin = non_blank(value);
        self
    }

    /// Attach a face photo. The raw image is downscaled and re-encoded
    /// by [`prepare_face_photo`]; a photo that still exceeds the size
    /// ceiling is dropped with a warning and enrollment proceeds
    /// without it.
    pub fn face_photo(mut self, raw: &[u8]) -> ClientResult<Self> {
        match prepare_face_photo(raw)? {
            Some(jpeg) => {
                self.face_image = Some(base64::engine::general_purpose::STANDARD.encode(jpeg));
            }
            None => {
                tracing::warn!(
                    person_sn = %self.person_sn,
                    "Face photo exceeds size ceiling after re-encode, enrolling without it"
                );
            }
        }
        Ok(self)
    }
}

/// Downscale to at most [`MAX_PHOTO_DIMENSION`] on the longest side and
/// re-encode as JPEG at [`JPEG_QUALITY`]. Returns `None` when the
/// result still exceeds [`MAX_PHOTO_BYTES`].
pub fn prepare_face_photo(raw: &[u8]) -> ClientResult<Option<Vec<u8>>> {
    let img = image::load_from_memory(raw)?;
    let img = if img.width().max(img.height()) > MAX_PHOTO_DIMENSION {
        img.resize(MAX_PHOTO_DIMENSION, MAX_PHOTO_DIMENSION, FilterType::Triangle)
    } else {
        img
    };

    // JPEG has no alpha channel.
    let rgb = image::DynamicImage::ImageRgb8(img.to_rgb8());

    let mut out = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY);
    rgb.write_with_encoder(encoder)?;

    if out.len() > MAX_PHOTO_BYTES {
        Ok(None)
    } else {
        Ok(Some(out))
    }
}

/// Which biometric to register or look up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BiometricKind {
    Face,
    Palm,
    Card,
}

/// Palm side selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hand {
    Left,
    Right,
}

impl Hand {
    pub fn as_wire(&self) -> &'static str {
        match self {
            Hand::Left => "left",
            Hand::Right => "right",
        }
    }
}

/// Kind-specific registration payload.
#[derive(Debug)]
pub enum BiometricRegistration<'a> {
    /// Raw photo bytes; prepared through the same pipeline as
    /// enrollment photos.
    Face { photo: &'a [u8] },
    /// Palm feature blob plus the side it was captured from. The palm
    /// identifier the middleware requires is generated here.
    Palm { feature: &'a str, hand: Hand },
    Card { card_number: &'a str },
}

impl DeviceClient {
    /// Enroll (or update) a person on the device.
    pub async fn add_person(&self, person: &NewPerson) -> ClientResult<()> {
        let _: serde_json::Value = self
            .proxy_idempotent("/api/device/person/merge", person)
            .await?;
        tracing::info!(person_sn = %person.person_sn(), "Person enrolled");
        Ok(())
    }

    /// Register one biometric for an already-enrolled person,
    /// dispatching to the kind-specific proxy endpoint.
    pub async fn register_biometric(
        &self,
        person_sn: &str,
        registration: BiometricRegistration<'_>,
    ) -> ClientResult<()> {
        match registration {
            BiometricRegistration::Face { photo } => {
                let jpeg = prepare_face_photo(photo)?.ok_or(ClientError::PayloadTooLarge)?;

                #[derive(Serialize)]
                #[serde(rename_all = "camelCase")]
                struct Body<'a> {
                    person_sn: &'a str,
                    face_image: String,
                }
                let body = Body {
                    person_sn,
                    face_image: base64::engine::general_purpose::STANDARD.encode(jpeg),
                };
                let _: serde_json::Value =
                    self.proxy_idempotent("/api/device/face/register", body).await?;
            }
            BiometricRegistration::Palm { feature, hand } => {
                #[derive(Serialize)]
                #[serde(rename_all = "camelCase")]
                struct Body<'a> {
                    person_sn: &'a str,
                    palm_id: String,
                    hand: &'static str,
                    feature: &'a str,
                }
                let body = Body {
                    person_sn,
                    palm_id: Uuid::new_v4().to_string(),
                    hand: hand.as_wire(),
                    feature,
                };
                let _: serde_json::Value =
                    self.proxy_idempotent("/api/palm/register", body).await?;
            }
            BiometricRegistration::Card { card_number } => {
                #[derive(Serialize)]
                #[serde(rename_all = "camelCase")]
                struct Body<'a> {
                    person_sn: &'a str,
                    card_number: &'a str,
                }
                let body = Body {
                    person_sn,
                    card_number,
                };
                let _: serde_json::Value =
                    self.proxy_idempotent("/api/device/card/register", body).await?;
            }
        }

        tracing::info!(person_sn, "Biometric registered");
        Ok(())
    }

    /// Persons not yet carrying the given biometric. Fetches the full
    /// person list, then fans out one lookup per person; a failed
    /// lookup counts as "not enrolled". The fan-out is unbounded and
    /// assumes small person counts.
    pub async fn available_for_enrollment(
        &self,
        kind: BiometricKind,
    ) -> ClientResult<Vec<Person>> {
        if kind == BiometricKind::Card {
            return Err(ClientError::Validation(
                "card registrations have no lookup endpoint".to_string(),
            ));
        }

        let persons = self.persons().await?;

        let lookups = persons.iter().map(|person| async move {
            let enrolled = match kind {
                BiometricKind::Face => self
                    .find_faces(&person.person_sn)
                    .await
                    .map(|faces| !faces.is_empty()),
                BiometricKind::Palm => self
                    .find_palms(&person.person_sn)
                    .await
                    .map(|palms| !palms.is_empty()),
                BiometricKind::Card => unreachable!(),
            };
            match enrolled {
                Ok(enrolled) => enrolled,
                Err(e) => {
                    tracing::debug!(person_sn = %person.person_sn, error = %e, "Lookup failed, treating as not enrolled");
                    false
                }
            }
        });

        let enrolled_flags = join_all(lookups).await;

        Ok(persons
            .into_iter()
            .zip(enrolled_flags)
            .filter(|(_, enrolled)| !enrolled)
            .map(|(person, _)| person)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_person_serializes_exactly_two_keys() {
        let person = NewPerson::new(" P-001 ", "Ayu")
            .unwrap()
            .phone("")
            .gender("  ")
            .department("")
            .id_number("")
            .pin("");

        let value = serde_json::to_value(&person).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.len(), 2);
        assert_eq!(obj["personSn"], "P-001");
        assert_eq!(obj["name"], "Ayu");
    }

    #[test]
    fn test_provided_optionals_are_kept() {
        let person = NewPerson::new("P-002", "Dewi")
            .unwrap()
            .phone("0812-000")
            .department("Finance");

        let value = serde_json::to_value(&person).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.len(), 4);
        assert_eq!(obj["phone"], "0812-000");
        assert_eq!(obj["department"], "Finance");
    }

    #[test]
    fn test_blank_identifiers_rejected() {
        assert!(NewPerson::new("", "Ayu").is_err());
        assert!(NewPerson::new("P-1", "   ").is_err());
    }

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        });
        let mut out = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut out, image::ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[test]
    fn test_photo_downscaled_to_ceiling() {
        let raw = png_bytes(1600, 1200);
        let jpeg = prepare_face_photo(&raw).unwrap().unwrap();

        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert!(decoded.width().max(decoded.height()) <= MAX_PHOTO_DIMENSION);
        assert_eq!(
            image::guess_format(&jpeg).unwrap(),
            image::ImageFormat::Jpeg
        );
    }

    #[test]
    fn test_small_photo_not_upscaled() {
        let raw = png_bytes(320, 240);
        let jpeg = prepare_face_photo(&raw).unwrap().unwrap();

        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!(decoded.width(), 320);
        assert_eq!(decoded.height(), 240);
    }

    #[test]
    fn test_hand_wire_values() {
        assert_eq!(Hand::Left.as_wire(), "left");
        assert_eq!(Hand::Right.as_wire(), "right");
    }
}
