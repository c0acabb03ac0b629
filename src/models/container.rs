//! Companion container that receives thumbnails.

pub const THUMBNAIL_CONTAINER_SUFFIX: &str = "_thumbnails";

/// What the object store answered to the create-if-absent request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provisioned {
    /// 201: the container did not exist and was created.
    Created,
    /// 202: the container was already there.
    AlreadyExisted,
    /// Any other status code, tolerated but not confirmed.
    Unconfirmed(u16),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationContainer {
    pub name: String,
    pub exists: bool,
    pub provisioned: Provisioned,
}

impl DestinationContainer {
    pub fn new(name: impl Into<String>, provisioned: Provisioned) -> Self {
        Self {
            name: name.into(),
            exists: !matches!(provisioned, Provisioned::Unconfirmed(_)),
            provisioned,
        }
    }

    /// `images` -> `images_thumbnails`.
    pub fn name_for(source_container: &str) -> String {
        format!("{source_container}{THUMBNAIL_CONTAINER_SUFFIX}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_is_derived_from_source_container() {
        assert_eq!(DestinationContainer::name_for("images"), "images_thumbnails");
    }

    #[test]
    fn unconfirmed_container_is_not_known_to_exist() {
        assert!(DestinationContainer::new("a_thumbnails", Provisioned::Created).exists);
        assert!(DestinationContainer::new("a_thumbnails", Provisioned::AlreadyExisted).exists);
        assert!(!DestinationContainer::new("a_thumbnails", Provisioned::Unconfirmed(401)).exists);
    }
}
