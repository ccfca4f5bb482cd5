use std::{env, path::PathBuf, process};

use omf::{
    AnimSlot, BkFile, ChrFile, PcxFile,
    fields::{AnimField, BkField, FieldValue, SpriteField},
};

struct Options {
    file: PathBuf,
    anim: Option<u8>,
    sprite: Option<usize>,
    key: Option<String>,
    key_index: Option<usize>,
    value: Option<String>,
    output: Option<PathBuf>,
    png: Option<PathBuf>,
    keylist: bool,
}

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        return;
    }

    let opts = match parse_args(&args[1..]) {
        Some(o) => o,
        None => {
            print_usage();
            process::exit(1);
        }
    };

    let extension = opts
        .file
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "bk" => run_bk(&opts),
        "chr" => run_chr(&opts),
        "pcx" => run_pcx(&opts),
        other => {
            eprintln!("Unrecognized file extension \"{}\".", other);
            process::exit(1);
        }
    }
}

fn parse_args(args: &[String]) -> Option<Options> {
    let mut opts = Options {
        file: PathBuf::from(&args[0]),
        anim: None,
        sprite: None,
        key: None,
        key_index: None,
        value: None,
        output: None,
        png: None,
        keylist: false,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-a" | "--anim" => {
                opts.anim = Some(args.get(i + 1)?.parse().ok()?);
                i += 2;
            }
            "-s" | "--sprite" => {
                opts.sprite = Some(args.get(i + 1)?.parse().ok()?);
                i += 2;
            }
            "-k" | "--key" => {
                opts.key = Some(args.get(i + 1)?.clone());
                i += 2;
                // An optional numeric argument selects an entry of an
                // indexed key, eg. "-k footer 3".
                if let Some(next) = args.get(i)
                    && let Ok(n) = next.parse::<usize>()
                {
                    opts.key_index = Some(n);
                    i += 1;
                }
            }
            "--value" => {
                opts.value = Some(args.get(i + 1)?.clone());
                i += 2;
            }
            "-o" | "--output" => {
                opts.output = Some(PathBuf::from(args.get(i + 1)?));
                i += 2;
            }
            "--png" => {
                opts.png = Some(PathBuf::from(args.get(i + 1)?));
                i += 2;
            }
            "--keylist" => {
                opts.keylist = true;
                i += 1;
            }
            other => {
                eprintln!("Unknown argument \"{}\".", other);
                return None;
            }
        }
    }

    Some(opts)
}

// BK --------------------------------------------------------------

fn run_bk(opts: &Options) {
    let mut bk = match BkFile::load(&opts.file) {
        Ok(bk) => bk,
        Err(e) => {
            eprintln!("Unable to load BK file: {}", e);
            process::exit(1);
        }
    };

    if opts.keylist {
        print_keylists();
        return;
    }

    if let Some(path) = &opts.png {
        let Some(pal) = bk.palettes.first() else {
            eprintln!("BK file has no palettes to decode the background with.");
            process::exit(1);
        };
        match bk.background.decode_rgba(pal) {
            Ok(img) => {
                if let Err(e) = img.write_png(path) {
                    eprintln!("Unable to write {}: {}", path.display(), e);
                    process::exit(1);
                }
                println!("Wrote {}", path.display());
            }
            Err(e) => {
                eprintln!("Unable to decode background: {}", e);
                process::exit(1);
            }
        }
        return;
    }

    match (opts.anim, &opts.key) {
        (Some(anim), _) => {
            let Some(slot) = bk.slot_mut(anim) else {
                println!("Animation #{} does not exist.", anim);
                return;
            };

            match opts.sprite {
                Some(sprite) => sprite_command(slot, sprite, opts),
                None => anim_command(slot, anim, opts),
            }
        }
        (None, Some(key)) => bk_key_command(&mut bk, key, opts),
        (None, None) => bk_info(&bk),
    }

    if let Some(path) = &opts.output {
        match bk.save(path) {
            Ok(()) => println!("Wrote {}", path.display()),
            Err(e) => {
                eprintln!("Unable to save BK file: {}", e);
                process::exit(1);
            }
        }
    }
}

fn bk_key_command(bk: &mut BkFile, key: &str, opts: &Options) {
    let field = match (key, opts.key_index) {
        ("fileid", _) => BkField::FileId,
        ("unknown", _) => BkField::UnknownA,
        ("footer", Some(i)) => BkField::Footer(i),
        ("footer", None) => {
            println!("Key footer requires an index parameter (eg. -k footer 3).");
            return;
        }
        _ => {
            println!("Unknown key!");
            return;
        }
    };

    match &opts.value {
        Some(raw) => {
            let current = match bk.get_field(field) {
                Ok(v) => v,
                Err(e) => {
                    println!("{}", e);
                    return;
                }
            };
            let Some(value) = parse_value(&current, raw) else {
                println!("Invalid value \"{}\" for key {}.", raw, key);
                return;
            };
            match bk.set_field(field, value) {
                Ok(()) => println!("Value set!"),
                Err(e) => println!("{}", e),
            }
        }
        None => match bk.get_field(field) {
            Ok(v) => println!("{}", v),
            Err(e) => println!("{}", e),
        },
    }
}

fn anim_command(slot: &mut AnimSlot, anim: u8, opts: &Options) {
    let Some(key) = &opts.key else {
        anim_info(slot, anim);
        return;
    };

    let field = match (key.as_str(), opts.key_index) {
        ("chain_hit", _) => AnimField::ChainHit,
        ("chain_no_hit", _) => AnimField::ChainNoHit,
        ("repeat", _) => AnimField::Repeat,
        ("probability", _) => AnimField::Probability,
        ("hazard_damage", _) => AnimField::HazardDamage,
        ("slot_str", _) => AnimField::SlotString,
        ("start_x", _) => AnimField::StartX,
        ("start_y", _) => AnimField::StartY,
        ("anim_str", _) => AnimField::AnimString,
        ("unknown", _) => AnimField::Unknown,
        ("header", Some(i)) => AnimField::Header(i),
        ("overlay", Some(i)) => AnimField::Overlay(i),
        ("extra_str", Some(i)) => AnimField::ExtraString(i),
        ("header" | "overlay" | "extra_str", None) => {
            println!("Key {} requires an index parameter.", key);
            return;
        }
        _ => {
            println!("Unknown key!");
            return;
        }
    };

    match &opts.value {
        Some(raw) => {
            let current = match slot.get_field(field) {
                Ok(v) => v,
                Err(e) => {
                    println!("{}", e);
                    return;
                }
            };
            let Some(value) = parse_value(&current, raw) else {
                println!("Invalid value \"{}\" for key {}.", raw, key);
                return;
            };
            match slot.set_field(field, value) {
                Ok(()) => println!("Value set!"),
                Err(e) => println!("{}", e),
            }
        }
        None => match slot.get_field(field) {
            Ok(v) => println!("{}", v),
            Err(e) => println!("{}", e),
        },
    }
}

fn sprite_command(slot: &mut AnimSlot, sprite: usize, opts: &Options) {
    let Some(s) = slot.animation.sprites.get_mut(sprite) else {
        println!("Sprite #{} does not exist.", sprite);
        return;
    };

    let Some(key) = &opts.key else {
        sprite_info(s, sprite);
        return;
    };

    let field = match key.as_str() {
        "x" => SpriteField::PosX,
        "y" => SpriteField::PosY,
        "index" => SpriteField::Index,
        "missing" => SpriteField::Missing,
        _ => {
            println!("Unknown key!");
            return;
        }
    };

    match &opts.value {
        Some(raw) => {
            let current = s.get_field(field);
            let Some(value) = parse_value(&current, raw) else {
                println!("Invalid value \"{}\" for key {}.", raw, key);
                return;
            };
            match s.set_field(field, value) {
                Ok(()) => println!("Value set!"),
                Err(e) => println!("{}", e),
            }
        }
        None => println!("{}", s.get_field(field)),
    }
}

fn bk_info(bk: &BkFile) {
    println!("BK File information:");
    println!(" * File ID: {}", bk.file_id);
    println!(" * Palettes: {}", bk.palettes.len());
    println!(" * Unknown A: {}", bk.unknown_a);
    println!(
        " * Background: {}x{} ({} bytes)",
        bk.background.width,
        bk.background.height,
        bk.background.data.len()
    );

    println!(" * Animations:");
    for (index, _) in &bk.slots {
        println!("   - {}", index);
    }

    print!(" * Footer: ");
    for byte in &bk.footer {
        print!("{} ", byte);
    }
    println!();
}

fn anim_info(slot: &AnimSlot, anim: u8) {
    let ani = &slot.animation;

    println!("Animation #{} information:", anim);
    println!(" * Chain # if hit:  {}", slot.chain_hit);
    println!(" * Chain # not hit: {}", slot.chain_no_hit);
    println!(" * Repeat:          {}", slot.repeat);
    println!(" * Probability:     {}", slot.probability);
    println!(" * Hazard damage:   {}", slot.hazard_damage);
    println!(" * String:          {}", String::from_utf8_lossy(&slot.string));
    println!(" * Start X:         {}", ani.start_x);
    println!(" * Start Y:         {}", ani.start_y);
    println!(" * Header:          {:?}", ani.header);
    println!(" * Overlays:        {}", ani.overlay_table.len());
    for overlay in &ani.overlay_table {
        println!("   - {}", overlay);
    }
    println!(" * Sprites:         {}", ani.frame_count());
    println!(
        " * Animation str:   {}",
        String::from_utf8_lossy(&ani.anim_string)
    );
    println!(" * Unknown:         {}", ani.unknown_b);
    println!(" * Extra strings:   {}", ani.extra_strings.len());
    for extra in &ani.extra_strings {
        println!("   - {}", String::from_utf8_lossy(extra));
    }
}

fn sprite_info(sprite: &omf::Sprite, index: usize) {
    println!("Sprite #{} information:", index);
    println!(" * X:        {}", sprite.pos_x);
    println!(" * Y:        {}", sprite.pos_y);
    println!(" * W:        {}", sprite.width);
    println!(" * H:        {}", sprite.height);
    println!(" * Index:    {}", sprite.index);
    println!(" * Missing:  {}", sprite.missing);
    println!(" * Length:   {}", sprite.len);
}

fn print_keylists() {
    println!("Valid field keys for the BK file root:");
    println!("* fileid");
    println!("* unknown");
    println!("* footer <byte #>");
    println!();
    println!("Valid field keys for animations (requires -a):");
    println!("* chain_hit");
    println!("* chain_no_hit");
    println!("* repeat");
    println!("* probability");
    println!("* hazard_damage");
    println!("* slot_str");
    println!("* start_x");
    println!("* start_y");
    println!("* header <byte #>");
    println!("* overlay <overlay #>");
    println!("* anim_str");
    println!("* unknown");
    println!("* extra_str <str #>");
    println!();
    println!("Valid field keys for sprites (requires -a and -s):");
    println!("* x");
    println!("* y");
    println!("* index");
    println!("* missing");
}

// CHR --------------------------------------------------------------

fn run_chr(opts: &Options) {
    let chr = match ChrFile::load(&opts.file) {
        Ok(chr) => chr,
        Err(e) => {
            eprintln!("Unable to load CHR file: {}", e);
            process::exit(1);
        }
    };

    if let Some(path) = &opts.png {
        match chr.photo.decode_rgba(&chr.palette) {
            Ok(img) => {
                if let Err(e) = img.write_png(path) {
                    eprintln!("Unable to write {}: {}", path.display(), e);
                    process::exit(1);
                }
                println!("Wrote {}", path.display());
            }
            Err(e) => {
                eprintln!("Unable to decode photo: {}", e);
                process::exit(1);
            }
        }
        return;
    }

    println!("CHR File information:");
    println!(" * Name:     {}", chr.pilot.name());
    println!(
        " * Robot:    {}",
        chr.pilot
            .har()
            .map(|h| format!("{:?}", h))
            .unwrap_or_else(|| format!("unknown ({})", chr.pilot.har_id))
    );
    println!(" * Record:   {}-{}", chr.pilot.wins, chr.pilot.losses);
    println!(" * Rank:     {}", chr.pilot.rank);
    println!(" * Money:    {}", chr.pilot.money);
    println!(
        " * Photo:    {}x{}",
        chr.photo.width, chr.photo.height
    );
    println!(" * Enemies:  {}", chr.enemies.len());
    for enemy in &chr.enemies {
        println!("   - {}", enemy.pilot.name());
    }
}

// PCX --------------------------------------------------------------

fn run_pcx(opts: &Options) {
    let pcx = match PcxFile::load(&opts.file) {
        Ok(pcx) => pcx,
        Err(e) => {
            eprintln!("Unable to load PCX file: {}", e);
            process::exit(1);
        }
    };

    if let Some(path) = &opts.png {
        let img = pcx.decode_rgba(&pcx.header_palette());
        if let Err(e) = img.write_png(path) {
            eprintln!("Unable to write {}: {}", path.display(), e);
            process::exit(1);
        }
        println!("Wrote {}", path.display());
        return;
    }

    println!("PCX File information:");
    println!(" * Version:   {}", pcx.version);
    println!(" * Encoding:  {}", pcx.encoding);
    println!(
        " * Window:    ({},{})-({},{})",
        pcx.window_x_min, pcx.window_y_min, pcx.window_x_max, pcx.window_y_max
    );
    println!(" * DPI:       {}x{}", pcx.horz_dpi, pcx.vert_dpi);
    println!(" * Planes:    {}", pcx.color_planes);
}

/// Parses `raw` into the same variant as the field's current value, so the
/// set path never has to guess a field's width.
fn parse_value(current: &FieldValue, raw: &str) -> Option<FieldValue> {
    let value = match current {
        FieldValue::U8(_) => FieldValue::U8(raw.parse().ok()?),
        FieldValue::U16(_) => FieldValue::U16(raw.parse().ok()?),
        FieldValue::U32(_) => FieldValue::U32(raw.parse().ok()?),
        FieldValue::I16(_) => FieldValue::I16(raw.parse().ok()?),
        FieldValue::I32(_) => FieldValue::I32(raw.parse().ok()?),
        FieldValue::Bytes(_) => FieldValue::Bytes(raw.as_bytes().to_vec()),
    };
    Some(value)
}

fn print_usage() {
    println!(
        r"Usage: omftool <file> [options]

Options:
  -a, --anim <id>       Select an animation slot (.bk)
  -s, --sprite <id>     Select a sprite (requires -a)
  -k, --key <key> [i]   Get a field; some keys take an index
      --value <value>   Set the selected key (requires -k)
  -o, --output <file>   Write the (possibly modified) file back out (.bk)
      --png <file>      Export image data as PNG
      --keylist         Print the valid keys

Examples:
    omftool fighter.chr
    omftool arena.bk -a 4
    omftool arena.bk -a 4 -s 0 -k x --value 12 -o arena_out.bk
    omftool scene.pcx --png scene.png"
    );
}
