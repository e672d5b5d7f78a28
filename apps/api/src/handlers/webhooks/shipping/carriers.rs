use crate::error::{ApiError, ApiResult};

/// Carriers accepted by the shipping webhook ingress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Carrier {
    Dhl,
    JpPost,
    Yamato,
    Ups,
    Fedex,
}

/// How a carrier proves a webhook call is genuine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarrierAuth {
    /// Hex HMAC-SHA256 of the raw body in the named header.
    Hmac { header: &'static str },
    /// Bearer token in `Authorization`.
    Bearer,
    /// Raw token in the named header.
    HeaderToken { header: &'static str },
    /// Client IP must fall inside the allow-list.
    Cidr,
}

const DHL_STATUSES: &[(&str, &str)] = &[
    ("pre_transit", "label_created"),
    ("transit", "in_transit"),
    ("in_transit", "in_transit"),
    ("out_for_delivery", "out_for_delivery"),
    ("delivered", "delivered"),
    ("exception", "exception"),
    ("return_to_sender", "return_to_sender"),
    ("arrived_at_facility", "arrived_hub"),
];

const JP_POST_STATUSES: &[(&str, &str)] = &[
    ("posting", "picked_up"),
    ("in_transit", "in_transit"),
    ("arrival", "arrived_hub"),
    ("out_for_delivery", "out_for_delivery"),
    ("delivered", "delivered"),
    ("undeliverable", "exception"),
    ("return", "return_to_sender"),
];

const YAMATO_STATUSES: &[(&str, &str)] = &[
    ("pickup", "picked_up"),
    ("in_transit", "in_transit"),
    ("with_courier", "out_for_delivery"),
    ("delivered", "delivered"),
    ("exception", "exception"),
    ("return_to_sender", "return_to_sender"),
];

const UPS_STATUSES: &[(&str, &str)] = &[
    ("d", "delivered"),
    ("i", "in_transit"),
    ("o", "out_for_delivery"),
    ("x", "exception"),
    ("r", "return_to_sender"),
    ("p", "picked_up"),
    ("n", "arrived_hub"),
];

const FEDEX_STATUSES: &[(&str, &str)] = &[
    ("dl", "delivered"),
    ("od", "out_for_delivery"),
    ("it", "in_transit"),
    ("ex", "exception"),
    ("rs", "return_to_sender"),
];

impl Carrier {
    /// Resolves a path segment such as `JP_Post` or `jppost`.
    #[must_use]
    pub fn from_path(raw: &str) -> Option<Self> {
        match normalize_carrier_key(raw).as_str() {
            "dhl" => Some(Self::Dhl),
            "jp-post" => Some(Self::JpPost),
            "yamato" => Some(Self::Yamato),
            "ups" => Some(Self::Ups),
            "fedex" => Some(Self::Fedex),
            _ => None,
        }
    }

    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::Dhl => "dhl",
            Self::JpPost => "jp-post",
            Self::Yamato => "yamato",
            Self::Ups => "ups",
            Self::Fedex => "fedex",
        }
    }

    /// Name stored on shipment events and in `details.carrier`.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Dhl => "DHL",
            Self::JpPost => "JPPOST",
            Self::Yamato => "YAMATO",
            Self::Ups => "UPS",
            Self::Fedex => "FEDEX",
        }
    }

    #[must_use]
    pub fn auth(self) -> CarrierAuth {
        match self {
            Self::Dhl => CarrierAuth::Hmac {
                header: "x-dhl-signature",
            },
            Self::Ups => CarrierAuth::Hmac {
                header: "x-ups-signature",
            },
            Self::Yamato => CarrierAuth::Bearer,
            Self::Fedex => CarrierAuth::HeaderToken {
                header: "x-fedex-webhook-token",
            },
            Self::JpPost => CarrierAuth::Cidr,
        }
    }

    fn status_map(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::Dhl => DHL_STATUSES,
            Self::JpPost => JP_POST_STATUSES,
            Self::Yamato => YAMATO_STATUSES,
            Self::Ups => UPS_STATUSES,
            Self::Fedex => FEDEX_STATUSES,
        }
    }

    /// Maps a raw carrier status onto the shipment vocabulary.
    ///
    /// Codes the carrier table does not know pass through lowercased.
    pub fn translate_status(self, raw: &str) -> ApiResult<String> {
        let status = raw.trim().to_lowercase();
        if status.is_empty() {
            return Err(ApiError::bad_request("invalid_status", "status is required"));
        }

        let mapped = self
            .status_map()
            .iter()
            .find(|(code, _)| *code == status)
            .map(|(_, mapped)| (*mapped).to_owned());
        Ok(mapped.unwrap_or(status))
    }
}

pub fn normalize_carrier_key(raw: &str) -> String {
    let key = raw.trim().to_lowercase().replace(['_', ' '], "-");
    if key == "jppost" {
        return "jp-post".to_owned();
    }
    key
}

#[cfg(test)]
mod tests {
    use super::{Carrier, normalize_carrier_key};

    #[test]
    fn carrier_keys_are_normalized() {
        assert_eq!(normalize_carrier_key(" JP_Post "), "jp-post");
        assert_eq!(normalize_carrier_key("jppost"), "jp-post");
        assert_eq!(normalize_carrier_key("jp post"), "jp-post");
        assert_eq!(Carrier::from_path("FedEx"), Some(Carrier::Fedex));
        assert_eq!(Carrier::from_path("sagawa"), None);
    }

    #[test]
    fn statuses_translate_through_carrier_tables() {
        let cases = [
            (Carrier::Dhl, "Delivered", "delivered"),
            (Carrier::Dhl, "arrived_at_facility", "arrived_hub"),
            (Carrier::JpPost, "UNDELIVERABLE", "exception"),
            (Carrier::Yamato, "with_courier", "out_for_delivery"),
            (Carrier::Ups, "N", "arrived_hub"),
            (Carrier::Fedex, "DL", "delivered"),
            (Carrier::Fedex, "RS", "return_to_sender"),
            (Carrier::Ups, "Held_At_Depot", "held_at_depot"),
        ];
        for (carrier, raw, expected) in cases {
            assert_eq!(
                carrier.translate_status(raw).unwrap_or_default(),
                expected,
                "{} {raw}",
                carrier.key()
            );
        }
    }

    #[test]
    fn blank_status_is_rejected() {
        let error = Carrier::Dhl.translate_status("  ").err();
        assert_eq!(error.map(|error| error.code()), Some("invalid_status"));
    }
}
