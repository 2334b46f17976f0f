//! ZoneGroupTopology actions

use xmltree::Element;

use crate::operation::child_text;
use crate::{ApiError, Service, SonosOperation};

/// GetZoneGroupAttributes operation: the zone the device belongs to
pub struct GetZoneGroupAttributesOperation;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetZoneGroupAttributesResponse {
    pub current_zone_group_name: String,
    pub current_zone_group_id: String,
    /// Comma separated UUIDs of the players in the group
    pub current_zone_player_uuids_in_group: String,
}

impl GetZoneGroupAttributesResponse {
    /// Member player UUIDs, in the order the device lists them
    pub fn member_uuids(&self) -> Vec<&str> {
        self.current_zone_player_uuids_in_group
            .split(',')
            .map(str::trim)
            .filter(|uuid| !uuid.is_empty())
            .collect()
    }
}

impl SonosOperation for GetZoneGroupAttributesOperation {
    type Request = ();
    type Response = GetZoneGroupAttributesResponse;

    const SERVICE: Service = Service::ZoneGroupTopology;
    const ACTION: &'static str = "GetZoneGroupAttributes";

    fn build_payload(_request: &Self::Request) -> String {
        String::new()
    }

    fn parse_response(xml: &Element) -> Result<Self::Response, ApiError> {
        Ok(GetZoneGroupAttributesResponse {
            current_zone_group_name: child_text(xml, "CurrentZoneGroupName")?,
            current_zone_group_id: child_text(xml, "CurrentZoneGroupID")?,
            current_zone_player_uuids_in_group: child_text(xml, "CurrentZonePlayerUUIDsInGroup")
                .unwrap_or_default(),
        })
    }
}
