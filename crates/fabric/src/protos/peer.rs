use super::common;

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProcessedTransaction {
    #[prost(message, optional, tag = "1")]
    pub transaction_envelope: Option<common::Envelope>,
    #[prost(int32, tag = "2")]
    pub validation_code: i32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Transaction {
    #[prost(message, repeated, tag = "1")]
    pub actions: Vec<TransactionAction>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TransactionAction {
    #[prost(bytes = "vec", tag = "1")]
    pub header: Vec<u8>,
    /// A serialized `ChaincodeActionPayload`.
    #[prost(bytes = "vec", tag = "2")]
    pub payload: Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ChaincodeActionPayload {
    /// A serialized `ChaincodeProposalPayload`.
    #[prost(bytes = "vec", tag = "1")]
    pub chaincode_proposal_payload: Vec<u8>,
    #[prost(message, optional, tag = "2")]
    pub action: Option<ChaincodeEndorsedAction>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ChaincodeEndorsedAction {
    /// A serialized `ProposalResponsePayload`.
    #[prost(bytes = "vec", tag = "1")]
    pub proposal_response_payload: Vec<u8>,
    #[prost(message, repeated, tag = "2")]
    pub endorsements: Vec<Endorsement>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Endorsement {
    #[prost(bytes = "vec", tag = "1")]
    pub endorser: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub signature: Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ChaincodeProposalPayload {
    /// A serialized `ChaincodeInvocationSpec`.
    #[prost(bytes = "vec", tag = "1")]
    pub input: Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ChaincodeInvocationSpec {
    #[prost(message, optional, tag = "1")]
    pub chaincode_spec: Option<ChaincodeSpec>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ChaincodeSpec {
    #[prost(int32, tag = "1")]
    pub r#type: i32,
    #[prost(message, optional, tag = "2")]
    pub chaincode_id: Option<ChaincodeId>,
    #[prost(message, optional, tag = "3")]
    pub input: Option<ChaincodeInput>,
    #[prost(int32, tag = "4")]
    pub timeout: i32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ChaincodeId {
    #[prost(string, tag = "1")]
    pub path: String,
    #[prost(string, tag = "2")]
    pub name: String,
    #[prost(string, tag = "3")]
    pub version: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ChaincodeInput {
    #[prost(bytes = "vec", repeated, tag = "1")]
    pub args: Vec<Vec<u8>>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ProposalResponsePayload {
    #[prost(bytes = "vec", tag = "1")]
    pub proposal_hash: Vec<u8>,
    /// A serialized `ChaincodeAction`.
    #[prost(bytes = "vec", tag = "2")]
    pub extension: Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ChaincodeAction {
    /// A serialized `rwset.TxReadWriteSet`.
    #[prost(bytes = "vec", tag = "1")]
    pub results: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub events: Vec<u8>,
    #[prost(message, optional, tag = "3")]
    pub response: Option<Response>,
    #[prost(message, optional, tag = "4")]
    pub chaincode_id: Option<ChaincodeId>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Response {
    #[prost(int32, tag = "1")]
    pub status: i32,
    #[prost(string, tag = "2")]
    pub message: String,
    #[prost(bytes = "vec", tag = "3")]
    pub payload: Vec<u8>,
}

// Deliver seek messages. The peer's deliver service reuses the orderer's
// seek framing; only the field numbers travel on the wire.

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SeekInfo {
    #[prost(message, optional, tag = "1")]
    pub start: Option<SeekPosition>,
    #[prost(message, optional, tag = "2")]
    pub stop: Option<SeekPosition>,
    #[prost(int32, tag = "3")]
    pub behavior: i32,
    #[prost(int32, tag = "4")]
    pub error_response: i32,
    #[prost(int32, tag = "5")]
    pub content_type: i32,
}

/// `SeekInfo.behavior` value: hold the stream open and deliver blocks as
/// they commit.
pub const SEEK_BLOCK_UNTIL_READY: i32 = 1;

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SeekPosition {
    #[prost(oneof = "seek_position::Type", tags = "1, 2, 3, 4")]
    pub r#type: Option<seek_position::Type>,
}

pub mod seek_position {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Type {
        #[prost(message, tag = "1")]
        Newest(super::SeekNewest),
        #[prost(message, tag = "2")]
        Oldest(super::SeekOldest),
        #[prost(message, tag = "3")]
        Specified(super::SeekSpecified),
        #[prost(message, tag = "4")]
        NextCommit(super::SeekNextCommit),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SeekNewest {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SeekOldest {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SeekSpecified {
    #[prost(uint64, tag = "1")]
    pub number: u64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SeekNextCommit {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DeliverResponse {
    #[prost(oneof = "deliver_response::Type", tags = "1, 2")]
    pub r#type: Option<deliver_response::Type>,
}

pub mod deliver_response {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Type {
        /// A `common.Status` terminating or rejecting the seek.
        #[prost(int32, tag = "1")]
        Status(i32),
        #[prost(message, tag = "2")]
        Block(super::super::common::Block),
    }
}
