//! Operations and subscriptions executed against a mock zone player

use mockito::{Matcher, Server};
use sonos_api::operations::av_transport::{
    GetPositionInfoOperation, InstanceRequest, PlayOperation, PlayRequest,
};
use sonos_api::operations::rendering_control::{
    GetVolumeOperation, GetVolumeRequest, SetVolumeOperation, SetVolumeRequest,
};
use sonos_api::operations::zone_group_topology::GetZoneGroupAttributesOperation;
use sonos_api::{ApiError, Service, SonosClient};
use std::time::Duration;

fn address(server: &Server) -> (String, u16) {
    let host_with_port = server.host_with_port();
    let (host, port) = host_with_port.rsplit_once(':').unwrap();
    (host.to_string(), port.parse().unwrap())
}

fn envelope(inner: &str) -> String {
    format!(
        r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/" s:encodingStyle="http://schemas.xmlsoap.org/soap/encoding/"><s:Body>{inner}</s:Body></s:Envelope>"#
    )
}

#[test]
fn test_get_volume_round_trip() {
    let mut server = Server::new();
    let (ip, port) = address(&server);
    let mock = server
        .mock("POST", "/MediaRenderer/RenderingControl/Control")
        .match_header(
            "soapaction",
            "\"urn:schemas-upnp-org:service:RenderingControl:1#GetVolume\"",
        )
        .match_body(Matcher::Regex("<Channel>Master</Channel>".to_string()))
        .with_body(envelope(
            r#"<u:GetVolumeResponse xmlns:u="urn:schemas-upnp-org:service:RenderingControl:1"><CurrentVolume>50</CurrentVolume></u:GetVolumeResponse>"#,
        ))
        .create();

    let response = SonosClient::new()
        .execute::<GetVolumeOperation>(&ip, port, &GetVolumeRequest::master())
        .unwrap();

    assert_eq!(response.current_volume, 50);
    mock.assert();
}

#[test]
fn test_set_volume_sends_desired_volume() {
    let mut server = Server::new();
    let (ip, port) = address(&server);
    let mock = server
        .mock("POST", "/MediaRenderer/RenderingControl/Control")
        .match_body(Matcher::Regex("<DesiredVolume>80</DesiredVolume>".to_string()))
        .with_body(envelope(
            r#"<u:SetVolumeResponse xmlns:u="urn:schemas-upnp-org:service:RenderingControl:1"></u:SetVolumeResponse>"#,
        ))
        .create();

    SonosClient::new()
        .execute::<SetVolumeOperation>(&ip, port, &SetVolumeRequest::master(80))
        .unwrap();
    mock.assert();
}

#[test]
fn test_play_fault_surfaces_as_soap_fault() {
    let mut server = Server::new();
    let (ip, port) = address(&server);
    server
        .mock("POST", "/MediaRenderer/AVTransport/Control")
        .with_status(500)
        .with_body(envelope(
            r#"<s:Fault><faultcode>s:Client</faultcode><faultstring>UPnPError</faultstring><detail><UPnPError xmlns="urn:schemas-upnp-org:control-1-0"><errorCode>701</errorCode></UPnPError></detail></s:Fault>"#,
        ))
        .create();

    let result = SonosClient::new().execute::<PlayOperation>(&ip, port, &PlayRequest::default());
    assert!(matches!(result, Err(ApiError::SoapFault(701))));
}

#[test]
fn test_position_info_and_zone_attributes() {
    let mut server = Server::new();
    let (ip, port) = address(&server);
    server
        .mock("POST", "/MediaRenderer/AVTransport/Control")
        .with_body(envelope(
            r#"<u:GetPositionInfoResponse xmlns:u="urn:schemas-upnp-org:service:AVTransport:1"><Track>1</Track><TrackDuration>0:04:10</TrackDuration><TrackMetaData></TrackMetaData><TrackURI>x-rincon-queue:RINCON_1#0</TrackURI><RelTime>0:00:12</RelTime></u:GetPositionInfoResponse>"#,
        ))
        .create();
    server
        .mock("POST", "/ZoneGroupTopology/Control")
        .with_body(envelope(
            r#"<u:GetZoneGroupAttributesResponse xmlns:u="urn:schemas-upnp-org:service:ZoneGroupTopology:1"><CurrentZoneGroupName>Living Room</CurrentZoneGroupName><CurrentZoneGroupID>RINCON_1:7</CurrentZoneGroupID><CurrentZonePlayerUUIDsInGroup>RINCON_1</CurrentZonePlayerUUIDsInGroup></u:GetZoneGroupAttributesResponse>"#,
        ))
        .create();

    let client = SonosClient::new();
    let position = client
        .execute::<GetPositionInfoOperation>(&ip, port, &InstanceRequest::default())
        .unwrap();
    assert_eq!(position.track_duration, "0:04:10");
    assert_eq!(position.track_metadata, "");

    let zone = client
        .execute::<GetZoneGroupAttributesOperation>(&ip, port, &())
        .unwrap();
    assert_eq!(zone.current_zone_group_name, "Living Room");
    assert_eq!(zone.current_zone_group_id, "RINCON_1:7");
}

#[test]
fn test_subscription_lifecycle() {
    let mut server = Server::new();
    let (ip, port) = address(&server);
    server
        .mock("SUBSCRIBE", "/MediaRenderer/AVTransport/Event")
        .match_header("nt", "upnp:event")
        .with_header("SID", "uuid:RINCON_1_sub1")
        .with_header("TIMEOUT", "Second-1800")
        .create();
    let renewal = server
        .mock("SUBSCRIBE", "/MediaRenderer/AVTransport/Event")
        .match_header("sid", "uuid:RINCON_1_sub1")
        .with_header("TIMEOUT", "Second-1800")
        .create();
    let unsubscribe = server
        .mock("UNSUBSCRIBE", "/MediaRenderer/AVTransport/Event")
        .match_header("sid", "uuid:RINCON_1_sub1")
        .create();

    let mut subscription = SonosClient::new()
        .subscribe(&ip, port, Service::AVTransport, "http://10.0.0.2:3400", 1800)
        .unwrap();

    assert_eq!(subscription.subscription_id(), "uuid:RINCON_1_sub1");
    assert_eq!(subscription.service(), Service::AVTransport);
    assert!(!subscription.needs_renewal(Duration::from_secs(300)));
    assert!(subscription.needs_renewal(Duration::from_secs(3600)));

    subscription.renew().unwrap();
    renewal.assert();

    subscription.unsubscribe().unwrap();
    unsubscribe.assert();
}

#[test]
fn test_failed_subscribe_is_a_subscription_error() {
    let mut server = Server::new();
    let (ip, port) = address(&server);
    server
        .mock("SUBSCRIBE", "/MediaRenderer/RenderingControl/Event")
        .with_status(412)
        .create();

    let result = SonosClient::new().subscribe(
        &ip,
        port,
        Service::RenderingControl,
        "http://10.0.0.2:3400",
        1800,
    );
    assert!(matches!(result, Err(ApiError::SubscriptionError(_))));
}
