//! Parser registry with lazily built slots.

use std::sync::OnceLock;

use super::{
    available, ArpProtocol, EthernetProtocol, IcmpProtocol, Ipv4Protocol, Ipv6Protocol,
    LayerRecord, ProtocolTag, TcpProtocol, UdpProtocol,
};
use crate::error::DecodeError;

/// Core trait all layer parsers implement.
///
/// Parsers are stateless: every method is a pure function of its inputs.
pub trait Protocol: Send + Sync {
    /// Tag this parser decodes.
    fn tag(&self) -> ProtocolTag;

    /// Human-readable name.
    fn name(&self) -> &'static str {
        self.tag().name()
    }

    /// Smallest header this parser can decode.
    fn min_header_len(&self) -> usize;

    /// Cheap shape check: enough bytes at `offset`, plus any version nibble.
    ///
    /// Never fails. The decoder only calls [`decode`](Self::decode) when
    /// this returns true.
    fn can_decode(&self, data: &[u8], offset: usize) -> bool {
        available(data, offset) >= self.min_header_len()
    }

    /// Decode one header starting at `offset`.
    ///
    /// The next layer starts at `record.end()`.
    fn decode(&self, data: &[u8], offset: usize) -> Result<LayerRecord, DecodeError>;

    /// Protocol carried in this layer's payload, if any.
    fn next_protocol(&self, _record: &LayerRecord) -> Option<ProtocolTag> {
        None
    }
}

/// One of the seven layer parsers the registry can hold.
///
/// The parsers are zero-sized, so a registry slot is a tag-sized value and
/// the decode loop calls through a `match` rather than a boxed trait object.
#[derive(Debug, Clone, Copy)]
pub enum BuiltinProtocol {
    Ethernet(EthernetProtocol),
    Arp(ArpProtocol),
    Ipv4(Ipv4Protocol),
    Ipv6(Ipv6Protocol),
    Tcp(TcpProtocol),
    Udp(UdpProtocol),
    Icmp(IcmpProtocol),
}

/// Forward a `Protocol` method to whichever parser the variant wraps.
macro_rules! delegate_protocol {
    ($self:expr, $method:ident $(, $arg:expr)*) => {
        match $self {
            BuiltinProtocol::Ethernet(p) => p.$method($($arg),*),
            BuiltinProtocol::Arp(p) => p.$method($($arg),*),
            BuiltinProtocol::Ipv4(p) => p.$method($($arg),*),
            BuiltinProtocol::Ipv6(p) => p.$method($($arg),*),
            BuiltinProtocol::Tcp(p) => p.$method($($arg),*),
            BuiltinProtocol::Udp(p) => p.$method($($arg),*),
            BuiltinProtocol::Icmp(p) => p.$method($($arg),*),
        }
    };
}

impl Protocol for BuiltinProtocol {
    #[inline]
    fn tag(&self) -> ProtocolTag {
        delegate_protocol!(self, tag)
    }

    #[inline]
    fn name(&self) -> &'static str {
        delegate_protocol!(self, name)
    }

    #[inline]
    fn min_header_len(&self) -> usize {
        delegate_protocol!(self, min_header_len)
    }

    #[inline]
    fn can_decode(&self, data: &[u8], offset: usize) -> bool {
        delegate_protocol!(self, can_decode, data, offset)
    }

    #[inline]
    fn decode(&self, data: &[u8], offset: usize) -> Result<LayerRecord, DecodeError> {
        delegate_protocol!(self, decode, data, offset)
    }

    #[inline]
    fn next_protocol(&self, record: &LayerRecord) -> Option<ProtocolTag> {
        delegate_protocol!(self, next_protocol, record)
    }
}

/// Lets `register` take a bare parser as well as a factory.
impl From<EthernetProtocol> for BuiltinProtocol {
    fn from(p: EthernetProtocol) -> Self {
        BuiltinProtocol::Ethernet(p)
    }
}

impl From<ArpProtocol> for BuiltinProtocol {
    fn from(p: ArpProtocol) -> Self {
        BuiltinProtocol::Arp(p)
    }
}

impl From<Ipv4Protocol> for BuiltinProtocol {
    fn from(p: Ipv4Protocol) -> Self {
        BuiltinProtocol::Ipv4(p)
    }
}

impl From<Ipv6Protocol> for BuiltinProtocol {
    fn from(p: Ipv6Protocol) -> Self {
        BuiltinProtocol::Ipv6(p)
    }
}

impl From<TcpProtocol> for BuiltinProtocol {
    fn from(p: TcpProtocol) -> Self {
        BuiltinProtocol::Tcp(p)
    }
}

impl From<UdpProtocol> for BuiltinProtocol {
    fn from(p: UdpProtocol) -> Self {
        BuiltinProtocol::Udp(p)
    }
}

impl From<IcmpProtocol> for BuiltinProtocol {
    fn from(p: IcmpProtocol) -> Self {
        BuiltinProtocol::Icmp(p)
    }
}

/// Constructor stored per tag; runs at most once, on first lookup.
pub type ParserFactory = fn() -> BuiltinProtocol;

#[derive(Debug, Clone)]
struct Slot {
    factory: ParserFactory,
    instance: OnceLock<BuiltinProtocol>,
}

/// Registry mapping each [`ProtocolTag`] to its parser.
///
/// Parsers are created lazily: registering stores a factory, and the first
/// [`get`](Self::get) for a tag instantiates exactly one parser for it.
/// Lookups after that return the same instance.
#[derive(Debug, Clone)]
pub struct ProtocolRegistry {
    slots: [Option<Slot>; ProtocolTag::COUNT],
}

impl ProtocolRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| None),
        }
    }

    /// Register (or replace) the parser factory for a tag.
    pub fn register(&mut self, tag: ProtocolTag, factory: ParserFactory) {
        self.slots[tag.index()] = Some(Slot {
            factory,
            instance: OnceLock::new(),
        });
    }

    /// Remove a tag. Returns true if it was registered.
    pub fn unregister(&mut self, tag: ProtocolTag) -> bool {
        self.slots[tag.index()].take().is_some()
    }

    /// Get the parser for a tag, instantiating it on first use.
    ///
    /// An unregistered tag yields `None`, which ends the decode chain.
    #[inline]
    pub fn get(&self, tag: ProtocolTag) -> Option<&BuiltinProtocol> {
        self.slots[tag.index()].as_ref().map(|slot| {
            let parser = slot.instance.get_or_init(slot.factory);
            debug_assert_eq!(parser.tag(), tag, "factory registered under the wrong tag");
            parser
        })
    }

    /// Check whether a tag has a parser factory.
    pub fn is_registered(&self, tag: ProtocolTag) -> bool {
        self.slots[tag.index()].is_some()
    }

    /// Registered tags in chain order.
    pub fn tags(&self) -> impl Iterator<Item = ProtocolTag> + '_ {
        ProtocolTag::ALL
            .into_iter()
            .filter(|tag| self.is_registered(*tag))
    }

    /// Number of parsers instantiated so far.
    pub fn instantiated(&self) -> usize {
        self.slots
            .iter()
            .flatten()
            .filter(|slot| slot.instance.get().is_some())
            .count()
    }

    /// Get the number of registered parsers.
    pub fn len(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ProtocolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
