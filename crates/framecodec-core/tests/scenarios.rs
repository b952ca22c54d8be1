use etherparse::{PacketHeaders, SlicedPacket, TransportSlice};
use framecodec_core::codec::convert::internet_checksum;
use framecodec_core::{Codec, EncodeInput};
use serde_json::{Value, json};

fn eth(ether_type: Value) -> EncodeInput {
    EncodeInput::new(
        "eth",
        json!({
            "dmac": "00:11:22:33:44:55",
            "smac": "66:77:88:99:aa:bb",
            "etherType": ether_type,
        }),
    )
}

fn tcp_syn_packet() -> Vec<u8> {
    Codec::default()
        .encode(&[
            eth(json!("0x0800")),
            EncodeInput::new(
                "ipv4",
                json!({
                    "protocol": 6,
                    "sip": "192.168.1.1",
                    "dip": "192.168.1.2",
                    "flags": {"df": true},
                }),
            ),
            EncodeInput::new(
                "tcp",
                json!({
                    "srcport": 12345,
                    "dstport": 80,
                    "seq": 1,
                    "window": 65535,
                    "flags": {"syn": true},
                }),
            ),
        ])
        .unwrap()
        .into_packet()
}

#[test]
fn eth_ipv4_tcp_lengths_and_checksums() {
    let packet = tcp_syn_packet();
    assert_eq!(packet.len(), 54);

    let sliced = SlicedPacket::from_ethernet(&packet).unwrap();
    let Some(etherparse::NetSlice::Ipv4(ip)) = sliced.net else {
        panic!("expected ipv4");
    };
    let header = ip.header();
    assert_eq!(header.total_len(), 40);
    assert_eq!(header.header_checksum(), header.to_header().calc_header_checksum());

    let Some(TransportSlice::Tcp(tcp)) = sliced.transport else {
        panic!("expected tcp");
    };
    assert!(tcp.syn());
    assert_eq!(tcp.source_port(), 12345);
    let expected = tcp
        .to_header()
        .calc_checksum_ipv4(&header.to_header(), tcp.payload())
        .unwrap();
    assert_eq!(tcp.checksum(), expected);
}

#[test]
fn eth_ipv6_udp_checksum_matches_oracle() {
    let packet = Codec::default()
        .encode(&[
            eth(json!(0x86dd)),
            EncodeInput::new(
                "ipv6",
                json!({"nxt": 17, "sip": "2001:db8::1", "dip": "2001:db8::2"}),
            ),
            EncodeInput::new("udp", json!({"srcport": 53, "dstport": 40000})),
            EncodeInput::new("raw", json!({"data": "deadbeef01"})),
        ])
        .unwrap()
        .into_packet();

    let headers = PacketHeaders::from_ethernet_slice(&packet).unwrap();
    let Some(etherparse::NetHeaders::Ipv6(ip, _)) = headers.net else {
        panic!("expected ipv6");
    };
    assert_eq!(ip.payload_length, 13);
    let Some(etherparse::TransportHeader::Udp(udp)) = headers.transport else {
        panic!("expected udp");
    };
    assert_eq!(udp.length, 13);
    let expected = udp.calc_checksum_ipv6(&ip, &[0xde, 0xad, 0xbe, 0xef, 0x01]).unwrap();
    assert_eq!(udp.checksum, expected);
}

#[test]
fn decode_matches_encode_inputs() {
    let packet = tcp_syn_packet();
    let codec = Codec::default();
    let chain = codec.decode(&packet).unwrap();
    let ids: Vec<_> = chain.modules().iter().map(|module| module.id).collect();
    assert_eq!(ids, ["eth", "ipv4", "tcp"]);
    assert!(chain.errors().is_empty(), "{:?}", chain.errors());

    let ip = chain.find("ipv4").unwrap();
    assert_eq!(ip.uint("length"), Some(40));
    assert_eq!(ip.uint("hdrLen"), Some(20));
    assert_eq!(ip.value.at("sip").value(), Some(json!("192.168.1.1")));

    let reencoded = codec.encode(&chain.to_inputs()).unwrap();
    assert_eq!(reencoded.packet(), packet.as_slice());
}

#[test]
fn arp_with_opcode_zero_reports_one_error() {
    let mut frame = Codec::default()
        .encode(&[
            eth(json!(0x0806)),
            EncodeInput::new(
                "arp",
                json!({
                    "opcode": 2,
                    "sender": {"mac": "66:77:88:99:aa:bb", "ipv4": "10.0.0.1"},
                    "target": {"mac": "00:11:22:33:44:55", "ipv4": "10.0.0.2"},
                }),
            ),
        ])
        .unwrap()
        .into_packet();
    frame[14 + 6..14 + 8].copy_from_slice(&[0, 0]);

    let chain = Codec::default().decode(&frame).unwrap();
    let errors = chain.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].id, "arp");
    assert_eq!(errors[0].path, "opcode");
    assert_eq!(errors[0].message, "Opcode should be 1, 2, 3 or 4");
    assert_eq!(chain.find("arp").and_then(|arp| arp.uint("opcode")), Some(0));
}

#[test]
fn unknown_ether_type_falls_through_to_raw() {
    let mut frame = vec![0u8; 12];
    frame.extend_from_slice(&[0xff, 0xff]);
    frame.extend_from_slice(&[1, 2, 3, 4, 5]);
    let chain = Codec::default().decode(&frame).unwrap();
    let layers = chain.layers();
    assert_eq!(layers.len(), 2);
    assert_eq!(layers[1].id, "raw");
    assert_eq!((layers[1].start_pos, layers[1].end_pos), (14, 19));
    assert_eq!(layers[1].data, json!({"data": "0102030405"}));
    assert!(chain.errors().is_empty());
}

#[test]
fn vlan_tagged_icmp_decodes_through_the_tag() {
    let packet = Codec::default()
        .encode(&[
            eth(json!(0x8100)),
            EncodeInput::new("vlan", json!({"id": 100, "etherType": 0x0800})),
            EncodeInput::new(
                "ipv4",
                json!({"protocol": 1, "sip": "10.1.1.1", "dip": "10.1.1.2"}),
            ),
            EncodeInput::new("icmp", json!({"type": 8, "ident": 1, "seq": 1, "message": "00"})),
        ])
        .unwrap()
        .into_packet();

    let chain = Codec::default().decode(&packet).unwrap();
    let ids: Vec<_> = chain.modules().iter().map(|module| module.id).collect();
    assert_eq!(ids, ["eth", "vlan", "ipv4", "icmp"]);
    assert_eq!(chain.find("vlan").and_then(|vlan| vlan.uint("id")), Some(100));
    assert!(chain.errors().is_empty(), "{:?}", chain.errors());
}

#[test]
fn recode_recomputes_dependent_fields() {
    let codec = Codec::default();
    let mut chain = codec.decode(&tcp_syn_packet()).unwrap();
    let before = chain.packet()[14 + 10..14 + 12].to_vec();

    codec.recode_field(&mut chain, 1, "ttl", json!(1), true).unwrap();
    codec.recode_field(&mut chain, 1, "checksum", json!(0), true).unwrap();

    let packet = chain.packet();
    assert_eq!(packet[14 + 8], 1);
    assert_ne!(&packet[14 + 10..14 + 12], before.as_slice());
    let sliced = SlicedPacket::from_ethernet(packet).unwrap();
    let Some(etherparse::NetSlice::Ipv4(ip)) = sliced.net else {
        panic!("expected ipv4");
    };
    assert_eq!(
        ip.header().header_checksum(),
        ip.header().to_header().calc_header_checksum()
    );
}

#[test]
fn eth_ipv6_icmpv6_checksum_covers_pseudo_header() {
    let packet = Codec::default()
        .encode(&[
            eth(json!(0x86dd)),
            EncodeInput::new(
                "ipv6",
                json!({"nxt": 58, "sip": "2001:db8::1", "dip": "2001:db8::2"}),
            ),
            EncodeInput::new("icmpv6", json!({"type": 128, "message": "12340001cafe"})),
        ])
        .unwrap()
        .into_packet();

    let sliced = SlicedPacket::from_ethernet(&packet).unwrap();
    let Some(TransportSlice::Icmpv6(icmp)) = sliced.transport else {
        panic!("expected icmpv6");
    };
    assert_eq!(icmp.type_u8(), 128);

    let segment = &packet[54..];
    let mut pseudo = packet[22..54].to_vec();
    pseudo.extend_from_slice(&(segment.len() as u32).to_be_bytes());
    pseudo.extend_from_slice(&[0, 0, 0, 58]);
    assert_eq!(internet_checksum(&[&pseudo, segment]), 0);

    let chain = Codec::default().decode(&packet).unwrap();
    let ids: Vec<_> = chain.modules().iter().map(|module| module.id).collect();
    assert_eq!(ids, ["eth", "ipv6", "icmpv6"]);
    let decoded = chain.find("icmpv6").unwrap();
    assert_eq!(decoded.uint("type"), Some(128));
    assert_eq!(decoded.value.at("message").value(), Some(json!("12340001cafe")));
    assert!(chain.errors().is_empty(), "{:?}", chain.errors());
}

#[test]
fn tls_records_follow_tcp() {
    let codec = Codec::default();
    let packet = codec
        .encode(&[
            eth(json!(0x0800)),
            EncodeInput::new(
                "ipv4",
                json!({"protocol": 6, "sip": "10.0.0.1", "dip": "10.0.0.2"}),
            ),
            EncodeInput::new(
                "tcp",
                json!({"srcport": 443, "dstport": 50000, "flags": {"ack": true}}),
            ),
            EncodeInput::new("raw", json!({"data": "1703030003aabbcc"})),
        ])
        .unwrap()
        .into_packet();

    let chain = codec.decode(&packet).unwrap();
    let ids: Vec<_> = chain.modules().iter().map(|module| module.id).collect();
    assert_eq!(ids, ["eth", "ipv4", "tcp", "tls"]);
    let tls = chain.find("tls").unwrap();
    assert_eq!(
        tls.value.to_value(),
        json!({"contentType": 23, "version": 0x0303, "length": 3, "fragment": "aabbcc"})
    );
    assert!(chain.errors().is_empty(), "{:?}", chain.errors());

    let reencoded = codec.encode(&chain.to_inputs()).unwrap();
    assert_eq!(reencoded.packet(), packet.as_slice());
}

#[test]
fn back_to_back_tls_records_and_short_capture() {
    let packet = Codec::default()
        .encode(&[
            eth(json!(0x0800)),
            EncodeInput::new(
                "ipv4",
                json!({"protocol": 6, "sip": "10.0.0.1", "dip": "10.0.0.2"}),
            ),
            EncodeInput::new("tcp", json!({"srcport": 50000, "dstport": 443})),
            EncodeInput::new(
                "tls",
                json!({"contentType": 22, "version": 0x0301, "fragment": "01000000"}),
            ),
            EncodeInput::new("tls", json!({"contentType": 21, "length": 2, "fragment": "02"})),
        ])
        .unwrap()
        .into_packet();
    // the second record declares two bytes but only one was written
    assert_eq!(packet[packet.len() - 3..], [0x00, 0x02, 0x02]);

    let chain = Codec::default().decode(&packet).unwrap();
    let ids: Vec<_> = chain.modules().iter().map(|module| module.id).collect();
    assert_eq!(ids, ["eth", "ipv4", "tcp", "tls", "tls"]);
    let last = &chain.modules()[4];
    assert_eq!(last.end_pos(), packet.len());
    assert_eq!(last.errors.len(), 1);
    assert_eq!(last.errors[0].path, "length");
    assert_eq!(last.errors[0].message, "Length exceeds captured bytes");
}

#[test]
fn hop_by_hop_header_carries_udp() {
    let codec = Codec::default();
    let packet = codec
        .encode(&[
            eth(json!(0x86dd)),
            EncodeInput::new(
                "ipv6",
                json!({"nxt": 0, "sip": "fe80::1", "dip": "ff02::16"}),
            ),
            EncodeInput::new("ipv6-hopopt", json!({"nxt": 17, "options": "05020000"})),
            EncodeInput::new("udp", json!({"srcport": 5353, "dstport": 5353})),
            EncodeInput::new("raw", json!({"data": "00ff"})),
        ])
        .unwrap()
        .into_packet();

    let headers = PacketHeaders::from_ethernet_slice(&packet).unwrap();
    let Some(etherparse::NetHeaders::Ipv6(ip, _)) = headers.net else {
        panic!("expected ipv6");
    };
    assert_eq!(ip.payload_length, 8 + 8 + 2);
    let Some(etherparse::TransportHeader::Udp(udp)) = headers.transport else {
        panic!("expected udp after hop-by-hop");
    };
    assert_eq!(udp.length, 10);
    let expected = udp.calc_checksum_ipv6(&ip, &[0x00, 0xff]).unwrap();
    assert_eq!(udp.checksum, expected);

    let chain = codec.decode(&packet).unwrap();
    let ids: Vec<_> = chain.modules().iter().map(|module| module.id).collect();
    assert_eq!(ids, ["eth", "ipv6", "ipv6-hopopt", "udp", "raw"]);
    let hop = chain.find("ipv6-hopopt").unwrap();
    assert_eq!(hop.uint("hdrLen"), Some(0));
    assert_eq!(hop.value.at("options").value(), Some(json!("050200000100")));
    assert!(chain.errors().is_empty(), "{:?}", chain.errors());
}

#[test]
fn tcp_after_hop_by_hop() {
    let packet = Codec::default()
        .encode(&[
            eth(json!(0x86dd)),
            EncodeInput::new("ipv6", json!({"nxt": 0, "sip": "::1", "dip": "::2"})),
            EncodeInput::new("ipv6-hopopt", json!({"nxt": 6})),
            EncodeInput::new("tcp", json!({"srcport": 1, "dstport": 2})),
        ])
        .unwrap()
        .into_packet();
    let chain = Codec::default().decode(&packet).unwrap();
    let ids: Vec<_> = chain.modules().iter().map(|module| module.id).collect();
    assert_eq!(ids, ["eth", "ipv6", "ipv6-hopopt", "tcp"]);
    assert!(chain.errors().is_empty(), "{:?}", chain.errors());
}
