// SPDX-License-Identifier: GPL-3.0-only

//! Core types for frame processing results
//!
//! These types carry recognition and QR results from the processing loops
//! to the overlay model and the UI event surface.

use serde::{Deserialize, Serialize};

/// Recognition kinds served by the shared polling loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DetectionKind {
    Face,
    Object,
    Text,
}

impl DetectionKind {
    pub const ALL: [DetectionKind; 3] = [DetectionKind::Face, DetectionKind::Object, DetectionKind::Text];

    /// Feature name used in recognition requests
    pub fn feature_type(&self) -> &'static str {
        match self {
            DetectionKind::Face => "FACE_DETECTION",
            DetectionKind::Object => "OBJECT_LOCALIZATION",
            DetectionKind::Text => "TEXT_DETECTION",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            DetectionKind::Face => "Faces",
            DetectionKind::Object => "Objects",
            DetectionKind::Text => "Text",
        }
    }
}

/// A rectangular region within a frame
///
/// Coordinates are normalized (0.0 to 1.0) relative to the frame dimensions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameRegion {
    /// Left edge (0.0 = left of frame, 1.0 = right of frame)
    pub x: f32,
    /// Top edge (0.0 = top of frame, 1.0 = bottom of frame)
    pub y: f32,
    /// Width as fraction of frame width
    pub width: f32,
    /// Height as fraction of frame height
    pub height: f32,
}

impl FrameRegion {
    /// Create a frame region from pixel coordinates
    pub fn from_pixels(
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        frame_width: u32,
        frame_height: u32,
    ) -> Self {
        Self {
            x: x as f32 / frame_width as f32,
            y: y as f32 / frame_height as f32,
            width: width as f32 / frame_width as f32,
            height: height as f32 / frame_height as f32,
        }
    }

    /// Scale into absolute pixels of a frame
    pub fn to_pixels(&self, frame_width: u32, frame_height: u32) -> PixelBox {
        PixelBox {
            x: self.x * frame_width as f32,
            y: self.y * frame_height as f32,
            width: self.width * frame_width as f32,
            height: self.height * frame_height as f32,
        }
    }
}

/// A box in absolute pixels of the reference frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl PixelBox {
    /// Bounding box of a polygon's vertices
    pub fn from_vertices(vertices: &[(f32, f32)]) -> Option<Self> {
        let (first, rest) = vertices.split_first()?;
        let (mut min_x, mut min_y) = *first;
        let (mut max_x, mut max_y) = *first;
        for &(x, y) in rest {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
        Some(Self {
            x: min_x,
            y: min_y,
            width: max_x - min_x,
            height: max_y - min_y,
        })
    }
}

/// A labeled object location, normalized to the frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledRegion {
    pub bounds: FrameRegion,
    pub label: String,
    /// Detector confidence (0.0 to 1.0) if reported
    pub score: Option<f32>,
}

/// Result of one recognition call
///
/// Face boxes are absolute pixels of the 1280x720 reference frame, object
/// boxes are normalized to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DetectionResult {
    Faces(Vec<PixelBox>),
    Objects(Vec<LabeledRegion>),
    Text(String),
}

impl DetectionResult {
    pub fn kind(&self) -> DetectionKind {
        match self {
            DetectionResult::Faces(_) => DetectionKind::Face,
            DetectionResult::Objects(_) => DetectionKind::Object,
            DetectionResult::Text(_) => DetectionKind::Text,
        }
    }

    /// Whether the result has anything to draw
    pub fn is_empty(&self) -> bool {
        match self {
            DetectionResult::Faces(faces) => faces.is_empty(),
            DetectionResult::Objects(objects) => objects.is_empty(),
            DetectionResult::Text(text) => text.trim().is_empty(),
        }
    }

    /// Short description for notices and logs
    pub fn summary(&self) -> String {
        match self {
            DetectionResult::Faces(faces) => format!("{} face(s)", faces.len()),
            DetectionResult::Objects(objects) => {
                let labels: Vec<&str> = objects.iter().map(|o| o.label.as_str()).collect();
                if labels.is_empty() {
                    "no objects".to_string()
                } else {
                    labels.join(", ")
                }
            }
            DetectionResult::Text(text) => text.trim().to_string(),
        }
    }
}

/// WiFi security type parsed from QR code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WifiSecurity {
    /// No security (open network)
    None,
    /// WEP security (legacy, insecure)
    Wep,
    /// WPA/WPA2 Personal
    Wpa,
    /// WPA2 Enterprise
    Wpa2Enterprise,
    /// WPA3
    Wpa3,
}

impl WifiSecurity {
    /// Parse security type from WiFi QR code string
    pub fn parse(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "WEP" => Self::Wep,
            "WPA" | "WPA2" => Self::Wpa,
            "WPA2-EAP" | "WPA3-EAP" => Self::Wpa2Enterprise,
            "WPA3" | "SAE" => Self::Wpa3,
            "NOPASS" | "" => Self::None,
            _ => Self::Wpa,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::None => "Open",
            Self::Wep => "WEP",
            Self::Wpa => "WPA/WPA2",
            Self::Wpa2Enterprise => "Enterprise",
            Self::Wpa3 => "WPA3",
        }
    }
}

/// Action type derived from QR code content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum QrAction {
    /// URL that can be opened in a browser
    Url(String),

    /// WiFi network credentials
    Wifi {
        ssid: String,
        /// None for open networks
        password: Option<String>,
        security: WifiSecurity,
        hidden: bool,
    },

    Text(String),

    /// Phone number (tel: URI)
    Phone(String),

    /// Email address (mailto: URI)
    Email {
        address: String,
        subject: Option<String>,
        body: Option<String>,
    },

    /// SMS message (sms: or smsto: URI)
    Sms {
        number: String,
        message: Option<String>,
    },

    /// Geographic location (geo: URI)
    Location {
        latitude: f64,
        longitude: f64,
        label: Option<String>,
    },

    /// vCard contact information
    Contact(String),

    /// Calendar event (VCALENDAR)
    Event(String),
}

impl QrAction {
    /// Parse QR code content into an action
    ///
    /// Falls back to `Text` for unrecognized formats.
    pub fn parse(content: &str) -> Self {
        let trimmed = content.trim();

        if trimmed.starts_with("WIFI:") {
            return Self::parse_wifi(trimmed);
        }

        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            return Self::Url(trimmed.to_string());
        }

        if let Some(number) = trimmed.strip_prefix("tel:") {
            return Self::Phone(number.to_string());
        }

        if let Some(rest) = trimmed.strip_prefix("mailto:") {
            return Self::parse_mailto(rest);
        }

        if let Some(rest) = trimmed
            .strip_prefix("sms:")
            .or_else(|| trimmed.strip_prefix("smsto:"))
        {
            return Self::parse_sms(rest);
        }

        if let Some(loc) = trimmed.strip_prefix("geo:").and_then(Self::parse_geo) {
            return loc;
        }

        if trimmed.starts_with("BEGIN:VCARD") {
            return Self::Contact(trimmed.to_string());
        }

        if trimmed.starts_with("BEGIN:VCALENDAR") || trimmed.starts_with("BEGIN:VEVENT") {
            return Self::Event(trimmed.to_string());
        }

        // Bare domain names
        if trimmed.contains('.')
            && !trimmed.contains(' ')
            && trimmed.len() < 256
            && (trimmed.contains("www.")
                || trimmed.ends_with(".com")
                || trimmed.ends_with(".org")
                || trimmed.ends_with(".net")
                || trimmed.ends_with(".io"))
        {
            return Self::Url(format!("https://{}", trimmed));
        }

        Self::Text(trimmed.to_string())
    }

    /// Parse `WIFI:T:WPA;S:network;P:password;H:true;;`
    fn parse_wifi(content: &str) -> Self {
        let mut ssid = String::new();
        let mut password = None;
        let mut security = WifiSecurity::None;
        let mut hidden = false;

        let content = content.strip_prefix("WIFI:").unwrap_or(content);
        let content = content.trim_end_matches(';');

        for part in content.split(';') {
            if let Some((key, value)) = part.split_once(':') {
                let value = value
                    .replace("\\;", ";")
                    .replace("\\:", ":")
                    .replace("\\\\", "\\")
                    .replace("\\,", ",");

                match key {
                    "S" => ssid = value,
                    "P" => password = Some(value),
                    "T" => security = WifiSecurity::parse(&value),
                    "H" => hidden = value.eq_ignore_ascii_case("true"),
                    _ => {}
                }
            }
        }

        Self::Wifi {
            ssid,
            password,
            security,
            hidden,
        }
    }

    fn parse_mailto(content: &str) -> Self {
        let (address, params) = content.split_once('?').unwrap_or((content, ""));

        let mut subject = None;
        let mut body = None;
        for (key, value) in query_pairs(params) {
            match key.to_lowercase().as_str() {
                "subject" => subject = Some(value),
                "body" => body = Some(value),
                _ => {}
            }
        }

        Self::Email {
            address: address.to_string(),
            subject,
            body,
        }
    }

    fn parse_sms(content: &str) -> Self {
        let (number, params) = content.split_once('?').unwrap_or((content, ""));

        let message = query_pairs(params)
            .find(|(key, _)| key.eq_ignore_ascii_case("body"))
            .map(|(_, value)| value);

        Self::Sms {
            number: number.to_string(),
            message,
        }
    }

    fn parse_geo(content: &str) -> Option<Self> {
        let (coords, params) = content.split_once('?').unwrap_or((content, ""));

        let mut parts = coords.split(',');
        let latitude = parts.next()?.trim().parse::<f64>().ok()?;
        let longitude = parts.next()?.trim().parse::<f64>().ok()?;

        let label = query_pairs(params)
            .find(|(key, _)| *key == "q" || *key == "label")
            .map(|(_, value)| value);

        Some(Self::Location {
            latitude,
            longitude,
            label,
        })
    }

    /// Primary action label for this QR code type
    pub fn action_label(&self) -> &'static str {
        match self {
            Self::Url(_) => "Open Link",
            Self::Wifi { .. } => "Connect to WiFi",
            Self::Text(_) => "Copy Text",
            Self::Phone(_) => "Call",
            Self::Email { .. } => "Send Email",
            Self::Sms { .. } => "Send SMS",
            Self::Location { .. } => "Open Map",
            Self::Contact(_) => "Add Contact",
            Self::Event(_) => "Add Event",
        }
    }

    /// One-line description shown with a scan result
    pub fn describe(&self) -> String {
        match self {
            Self::Url(url) => format!("Link: {url}"),
            Self::Wifi { ssid, security, .. } => {
                format!("WiFi: {ssid} ({})", security.display_name())
            }
            Self::Text(text) => format!("Text: {text}"),
            Self::Phone(number) => format!("Phone: {number}"),
            Self::Email { address, .. } => format!("Email: {address}"),
            Self::Sms { number, .. } => format!("SMS: {number}"),
            Self::Location {
                latitude,
                longitude,
                label,
            } => match label {
                Some(label) => format!("Location: {label} ({latitude}, {longitude})"),
                None => format!("Location: {latitude}, {longitude}"),
            },
            Self::Contact(_) => "Contact card".to_string(),
            Self::Event(_) => "Calendar event".to_string(),
        }
    }
}

/// `key=value` pairs of a query string, values decoded
fn query_pairs(params: &str) -> impl Iterator<Item = (&str, String)> {
    params
        .split('&')
        .filter_map(|param| param.split_once('='))
        .map(|(key, value)| (key, urlencoding_decode(value)))
}

/// Percent/plus decoding for query parameters
fn urlencoding_decode(s: &str) -> String {
    let mut bytes = Vec::with_capacity(s.len());
    let mut chars = s.bytes();

    while let Some(c) = chars.next() {
        match c {
            b'%' => {
                let hex: Vec<u8> = chars.by_ref().take(2).collect();
                match std::str::from_utf8(&hex)
                    .ok()
                    .and_then(|h| u8::from_str_radix(h, 16).ok())
                {
                    Some(byte) => bytes.push(byte),
                    None => {
                        bytes.push(b'%');
                        bytes.extend_from_slice(&hex);
                    }
                }
            }
            b'+' => bytes.push(b' '),
            _ => bytes.push(c),
        }
    }

    String::from_utf8_lossy(&bytes).into_owned()
}

/// A detected QR code with its location and parsed content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QrDetection {
    /// Bounding box of the QR code in normalized frame coordinates
    pub bounds: FrameRegion,
    /// Raw content decoded from the QR code
    pub content: String,
    /// Parsed action based on content type
    pub action: QrAction,
}

impl QrDetection {
    pub fn new(bounds: FrameRegion, content: String) -> Self {
        let action = QrAction::parse(&content);
        Self {
            bounds,
            content,
            action,
        }
    }
}
