//! Application tag numbers
//!
//! Requests and the two container types use tags below 0x22. A response
//! carries its request's tag plus [`RESPONSE_GAP`]. Tags 0x1E and 0x1F are
//! reserved and never sent.

use dbdproxy_ber::{Form, Identifier};

pub const RESPONSE_GAP: u32 = 1000;

pub const ERROR_RESPONSE: u32 = 0x0A + RESPONSE_GAP;
pub const CONNECT_REQUEST: u32 = 0x0B;
pub const DISCONNECT_REQUEST: u32 = 0x0C;
pub const COMMIT_REQUEST: u32 = 0x0D;
pub const ROLLBACK_REQUEST: u32 = 0x0E;
pub const PREPARE_REQUEST: u32 = 0x0F;
pub const EXECUTE_REQUEST: u32 = 0x10;
pub const FETCH_REQUEST: u32 = 0x11;
pub const EXECUTE_ROWS_RESPONSE: u32 = 0x12 + RESPONSE_GAP;
pub const EXECUTE_RESULT_SET_RESPONSE: u32 = 0x13 + RESPONSE_GAP;
pub const GET_CONNECTION_PROPERTY_REQUEST: u32 = 0x14;
pub const GET_STATEMENT_PROPERTY_REQUEST: u32 = 0x15;
pub const SET_CONNECTION_PROPERTY_REQUEST: u32 = 0x16;
pub const SET_STATEMENT_PROPERTY_REQUEST: u32 = 0x17;
pub const STATEMENT_FINISH_REQUEST: u32 = 0x18;
pub const STATEMENT_DESTROY_REQUEST: u32 = 0x19;
pub const PING_REQUEST: u32 = 0x1A;
pub const BER_HASH: u32 = 0x1B;
pub const ERROR: u32 = 0x1C;
pub const CONNECTION_FUNC_REQUEST: u32 = 0x1D;
pub const STATEMENT_FUNC_REQUEST: u32 = 0x20;
pub const GET_GENERATED_KEYS_REQUEST: u32 = 0x21;

/// Tag of the response to `request`
pub const fn response_tag(request: u32) -> u32 {
    request + RESPONSE_GAP
}

/// Primitive APPLICATION identifier for `tag`
pub const fn primitive(tag: u32) -> Identifier {
    Identifier::application(Form::Primitive, tag)
}

/// Constructed APPLICATION identifier for `tag`
pub const fn constructed(tag: u32) -> Identifier {
    Identifier::application(Form::Constructed, tag)
}

/// Requests whose contents are empty
pub(crate) const EMPTY_REQUESTS: [u32; 4] = [
    DISCONNECT_REQUEST,
    COMMIT_REQUEST,
    ROLLBACK_REQUEST,
    PING_REQUEST,
];

/// Requests whose contents are a single statement handle
pub(crate) const HANDLE_REQUESTS: [u32; 3] = [
    FETCH_REQUEST,
    STATEMENT_FINISH_REQUEST,
    STATEMENT_DESTROY_REQUEST,
];

/// Requests encoded as constructed sequences
pub(crate) const SEQUENCE_REQUESTS: [u32; 10] = [
    CONNECT_REQUEST,
    PREPARE_REQUEST,
    EXECUTE_REQUEST,
    GET_STATEMENT_PROPERTY_REQUEST,
    SET_CONNECTION_PROPERTY_REQUEST,
    SET_STATEMENT_PROPERTY_REQUEST,
    CONNECTION_FUNC_REQUEST,
    STATEMENT_FUNC_REQUEST,
    GET_GENERATED_KEYS_REQUEST,
    BER_HASH,
];

/// Responses whose contents are empty
pub(crate) const EMPTY_RESPONSES: [u32; 8] = [
    response_tag(CONNECT_REQUEST),
    response_tag(DISCONNECT_REQUEST),
    response_tag(COMMIT_REQUEST),
    response_tag(ROLLBACK_REQUEST),
    response_tag(SET_CONNECTION_PROPERTY_REQUEST),
    response_tag(SET_STATEMENT_PROPERTY_REQUEST),
    response_tag(STATEMENT_FINISH_REQUEST),
    response_tag(STATEMENT_DESTROY_REQUEST),
];

/// Responses whose contents are a single integer
pub(crate) const INTEGER_RESPONSES: [u32; 4] = [
    response_tag(PREPARE_REQUEST),
    response_tag(PING_REQUEST),
    EXECUTE_ROWS_RESPONSE,
    EXECUTE_RESULT_SET_RESPONSE,
];

/// Responses encoded as constructed sequences
pub(crate) const SEQUENCE_RESPONSES: [u32; 8] = [
    ERROR_RESPONSE,
    ERROR,
    response_tag(EXECUTE_REQUEST),
    response_tag(FETCH_REQUEST),
    response_tag(GET_CONNECTION_PROPERTY_REQUEST),
    response_tag(GET_STATEMENT_PROPERTY_REQUEST),
    response_tag(CONNECTION_FUNC_REQUEST),
    response_tag(STATEMENT_FUNC_REQUEST),
];

/// Human-readable name of a request tag, for logs
pub fn request_name(tag: u32) -> &'static str {
    match tag {
        CONNECT_REQUEST => "Connect",
        DISCONNECT_REQUEST => "Disconnect",
        COMMIT_REQUEST => "Commit",
        ROLLBACK_REQUEST => "Rollback",
        PREPARE_REQUEST => "Prepare",
        EXECUTE_REQUEST => "Execute",
        FETCH_REQUEST => "Fetch",
        GET_CONNECTION_PROPERTY_REQUEST => "GetConnectionProperty",
        GET_STATEMENT_PROPERTY_REQUEST => "GetStatementProperty",
        SET_CONNECTION_PROPERTY_REQUEST => "SetConnectionProperty",
        SET_STATEMENT_PROPERTY_REQUEST => "SetStatementProperty",
        STATEMENT_FINISH_REQUEST => "StatementFinish",
        STATEMENT_DESTROY_REQUEST => "StatementDestroy",
        PING_REQUEST => "Ping",
        CONNECTION_FUNC_REQUEST => "ConnectionFunc",
        STATEMENT_FUNC_REQUEST => "StatementFunc",
        GET_GENERATED_KEYS_REQUEST => "GetGeneratedKeys",
        _ => "Unknown",
    }
}
