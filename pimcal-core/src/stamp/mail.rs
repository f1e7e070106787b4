use crate::property::{PropertyDef, PropertyDefault};

use super::StampRead;
use super::registry::StampDescriptor;

pub const MAIL_STAMP: &str = "mail";

pub const MESSAGE_ID: &str = "messageId";
pub const HEADERS: &str = "headers";
pub const FROM_ADDRESS: &str = "fromAddress";
pub const TO_ADDRESS: &str = "toAddress";
pub const CC_ADDRESS: &str = "ccAddress";
pub const BCC_ADDRESS: &str = "bccAddress";
pub const ORIGINATORS: &str = "originators";
pub const DATE_SENT: &str = "dateSent";
pub const IN_REPLY_TO: &str = "inReplyTo";
pub const REFERENCES: &str = "references";

const MAIL_SCHEMA: &[PropertyDef] = &[
    PropertyDef::new(MESSAGE_ID, PropertyDefault::Null),
    PropertyDef::new(HEADERS, PropertyDefault::Null),
    PropertyDef::new(FROM_ADDRESS, PropertyDefault::Null),
    PropertyDef::new(TO_ADDRESS, PropertyDefault::Null),
    PropertyDef::new(CC_ADDRESS, PropertyDefault::Null),
    PropertyDef::new(BCC_ADDRESS, PropertyDefault::Null),
    PropertyDef::new(ORIGINATORS, PropertyDefault::Null),
    PropertyDef::new(DATE_SENT, PropertyDefault::Null),
    PropertyDef::new(IN_REPLY_TO, PropertyDefault::Null),
    PropertyDef::new(REFERENCES, PropertyDefault::Null),
];

pub fn mail_descriptor() -> StampDescriptor {
    StampDescriptor::new(MAIL_STAMP, MAIL_SCHEMA)
}

/// Typed getters for mail stamp properties. Address lists read as empty when
/// unset.
pub trait MailFields: StampRead {
    fn message_id(&self) -> Option<String> {
        self.value(MESSAGE_ID).as_text().map(str::to_string)
    }

    fn from_address(&self) -> Vec<String> {
        text_list(self, FROM_ADDRESS)
    }

    fn to_address(&self) -> Vec<String> {
        text_list(self, TO_ADDRESS)
    }

    fn cc_address(&self) -> Vec<String> {
        text_list(self, CC_ADDRESS)
    }

    fn bcc_address(&self) -> Vec<String> {
        text_list(self, BCC_ADDRESS)
    }

    fn originators(&self) -> Vec<String> {
        text_list(self, ORIGINATORS)
    }

    fn date_sent(&self) -> Option<String> {
        self.value(DATE_SENT).as_text().map(str::to_string)
    }

    fn in_reply_to(&self) -> Option<String> {
        self.value(IN_REPLY_TO).as_text().map(str::to_string)
    }

    fn references(&self) -> Option<String> {
        self.value(REFERENCES).as_text().map(str::to_string)
    }
}

impl<T: StampRead + ?Sized> MailFields for T {}

fn text_list<S: StampRead + ?Sized>(stamp: &S, property: &str) -> Vec<String> {
    stamp
        .value(property)
        .as_text_list()
        .map(<[String]>::to_vec)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{PropertyMap, PropertyValue};

    #[test]
    fn test_address_lists() {
        let mut initial = PropertyMap::new();
        initial.insert(
            TO_ADDRESS.into(),
            PropertyValue::TextList(vec!["a@example.org".into(), "b@example.org".into()]),
        );
        initial.insert(MESSAGE_ID.into(), "<1@example.org>".into());

        let stamp = mail_descriptor().instantiate(&initial);

        assert_eq!(stamp.to_address().len(), 2);
        assert!(stamp.cc_address().is_empty());
        assert_eq!(stamp.message_id().as_deref(), Some("<1@example.org>"));
    }
}
