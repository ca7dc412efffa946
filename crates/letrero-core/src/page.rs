//! Fixed HTTP response carrying the message form.
//!
//! The message is spliced into the input's `value` attribute verbatim.

pub const RESPONSE_HEADER: &str =
    "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nConnection: close\r\n\r\n";

pub const PAGE_HEAD: &str = r##"<!DOCTYPE html>
<html>
<head>
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>ESP32 AND MAX7219</title>
    <meta charset="UTF-8">
    <style>
        html, body {
            font-family: Helvetica;
            display: block;
            margin: 0px auto;
            text-align: center;
            background-color: #cad9c5;
        }
        #container {
            width: 100%;
            height: 100%;
            margin-left: 5px;
            margin-top: 20px;
            border: solid 2px;
            padding: 10px;
            background-color: #2dfa53;
        }
    </style>
</head>
<body>
    <h1>Control WiFi de una matriu de LEDs amb ESP32</h1>
    <div id="container">
        <form id="txt_form" name="frmText" method="post">
            <label>Missatge:<input type="text" name="msg" maxlength="255" value=""##;

pub const PAGE_TAIL: &str = r##""></label><br>
            <input type="submit" value="Envia Text">
        </form>
    </div>
</body>
</html>
"##;

/// Response pieces in wire order: header, page head, message, page tail.
pub fn response_chunks(message: &str) -> [&[u8]; 4] {
    [
        RESPONSE_HEADER.as_bytes(),
        PAGE_HEAD.as_bytes(),
        message.as_bytes(),
        PAGE_TAIL.as_bytes(),
    ]
}

/// Total response size for `message`.
pub fn response_len(message: &str) -> usize {
    response_chunks(message).iter().map(|chunk| chunk.len()).sum()
}
