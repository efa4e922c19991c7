use std::borrow::Cow;
use std::env;
use std::ffi::OsString;
use std::fmt::Debug;
use std::fs::File;
use std::io::Read;
use std::process::ExitCode;

use codepage::to_encoding;
use encoding_rs::Encoding;
use env_logger;
use log::debug;
use msox::{ByteCursor, DecodeError, DecodeOptions, Guid, GuidByteOrder};
use msox::named::NamedPropertyInformation;
use msox::restriction::Restriction;
use msox::rule::{RuleAction, RuleFormat};
use msox::rule::extended::ExtendedRuleMessageActions;
use msox::search_folder::SearchFolderDefinition;
use msox::xid::{PredecessorChangeList, Xid};


const STRUCTURES: &str = "guid|xid|pcl|rule-action|extended-rule-actions|restriction|search-folder|named-props";


#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
enum Structure {
    Guid,
    Xid,
    PredecessorChangeList,
    RuleAction,
    ExtendedRuleActions,
    Restriction,
    SearchFolder,
    NamedProperties,
}
impl Structure {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "guid" => Some(Self::Guid),
            "xid" => Some(Self::Xid),
            "pcl" => Some(Self::PredecessorChangeList),
            "rule-action" => Some(Self::RuleAction),
            "extended-rule-actions" => Some(Self::ExtendedRuleActions),
            "restriction" => Some(Self::Restriction),
            "search-folder" => Some(Self::SearchFolder),
            "named-props" => Some(Self::NamedProperties),
            _ => None,
        }
    }
}


struct Args {
    string8_encoding: Option<&'static Encoding>,
    extended: bool,
    structure: Structure,
    path: OsString,
}
impl Args {
    fn parse(args: &[OsString]) -> Result<Self, String> {
        let mut string8_encoding = None;
        let mut extended = false;
        let mut positional = Vec::new();

        let mut iter = args.iter().skip(1);
        while let Some(arg) = iter.next() {
            match arg.to_str() {
                Some("--codepage") => {
                    let value = iter.next()
                        .ok_or_else(|| "--codepage requires a value".to_owned())?;
                    let codepage_id: u16 = value.to_string_lossy().parse()
                        .map_err(|_| format!("invalid codepage {:?}", value))?;
                    let encoding = to_encoding(codepage_id)
                        .ok_or_else(|| format!("no encoding known for codepage {}", codepage_id))?;
                    string8_encoding = Some(encoding);
                },
                Some("--extended") => extended = true,
                _ => positional.push(arg),
            }
        }

        if positional.len() != 2 {
            return Err("expected STRUCTURE and FILE".to_owned());
        }
        let structure_arg = positional[0].to_string_lossy();
        let structure = Structure::from_arg(&structure_arg)
            .ok_or_else(|| format!("unknown structure {:?}", structure_arg))?;

        Ok(Self {
            string8_encoding,
            extended,
            structure,
            path: positional[1].to_os_string(),
        })
    }
}


fn decode_as(structure: Structure, extended: bool, cursor: &mut ByteCursor<'_>) -> Result<Box<dyn Debug>, DecodeError> {
    let format = if extended { RuleFormat::Extended } else { RuleFormat::Standard };
    let value: Box<dyn Debug> = match structure {
        Structure::Guid => Box::new(Guid::read(cursor, GuidByteOrder::LittleEndian)?),
        Structure::Xid => {
            let size = cursor.len();
            Box::new(Xid::decode(cursor, size)?)
        },
        Structure::PredecessorChangeList => Box::new(PredecessorChangeList::decode(cursor)?),
        Structure::RuleAction => Box::new(RuleAction::decode(cursor, format)?),
        Structure::ExtendedRuleActions => Box::new(ExtendedRuleMessageActions::decode(cursor)?),
        Structure::Restriction => Box::new(Restriction::decode(cursor)?),
        Structure::SearchFolder => Box::new(SearchFolderDefinition::decode(cursor)?),
        Structure::NamedProperties => Box::new(NamedPropertyInformation::decode(cursor)?),
    };
    cursor.finish()?;
    Ok(value)
}


fn hexdump(bytes: &[u8], prefix: &str, mark_offset: Option<usize>) {
    let mut i = 0;

    while i < bytes.len() {
        let marker = match mark_offset {
            Some(offset) if offset >= i && offset < i + 16 => '>',
            _ => ' ',
        };
        eprint!("{}{}{:08x}", prefix, marker, i);
        for j in 0..16 {
            if i + j < bytes.len() {
                eprint!(" {:02x}", bytes[i + j]);
            } else {
                eprint!("   ");
            }
            if j == 7 {
                eprint!(" ");
            }
        }
        eprint!(" |");
        for j in 0..16 {
            if i + j < bytes.len() {
                let b = bytes[i + j];
                if (b >= 0x20 && b <= 0x7E) || b >= 0xA0 {
                    eprint!("{}", char::from(b));
                } else {
                    eprint!(".");
                }
            }
        }
        eprintln!("|");

        i += 16;
    }
}


fn main() -> ExitCode {
    let args: Vec<OsString> = env::args_os().collect();
    let args = match Args::parse(&args) {
        Ok(a) => a,
        Err(e) => {
            let arg0 = args
                .get(0)
                .map(|a| a.to_string_lossy())
                .unwrap_or(Cow::Borrowed("oxdump"));
            eprintln!("{}: {}", arg0, e);
            eprintln!("Usage: {} [--codepage N] [--extended] {{{}}} FILE", arg0, STRUCTURES);
            return ExitCode::from(2);
        },
    };

    env_logger::init();

    let mut buf = Vec::new();
    {
        let read_result = File::open(&args.path)
            .and_then(|mut file| file.read_to_end(&mut buf));
        if let Err(e) = read_result {
            eprintln!("failed to read {}: {}", args.path.to_string_lossy(), e);
            return ExitCode::FAILURE;
        }
    }
    debug!("decoding {} bytes as {:?}", buf.len(), args.structure);

    let mut options = DecodeOptions::default();
    if let Some(encoding) = args.string8_encoding {
        options.string8_encoding = encoding;
    }

    let mut cursor = ByteCursor::with_options(&buf, options);
    match decode_as(args.structure, args.extended, &mut cursor) {
        Ok(value) => {
            println!("{:#?}", value);
            ExitCode::SUCCESS
        },
        Err(e) => {
            eprintln!("failed to decode {:?}: {}", args.structure, e);
            hexdump(&buf, "  ", e.offset());
            ExitCode::FAILURE
        },
    }
}
