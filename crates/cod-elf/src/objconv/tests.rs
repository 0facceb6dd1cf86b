use super::*;

/// Builder for synthetic ELF32 REL objects.
struct Elf32Builder {
    sections: Vec<([u8; SHDR32_SIZE], Vec<u8>)>,
}

fn shdr32(
    sh_type: u32,
    sh_size: u32,
    sh_link: u32,
    sh_info: u32,
    sh_entsize: u32,
) -> [u8; SHDR32_SIZE] {
    let mut shdr = [0u8; SHDR32_SIZE];
    shdr[4..8].copy_from_slice(&sh_type.to_le_bytes());
    shdr[20..24].copy_from_slice(&sh_size.to_le_bytes());
    shdr[24..28].copy_from_slice(&sh_link.to_le_bytes());
    shdr[28..32].copy_from_slice(&sh_info.to_le_bytes());
    shdr[36..40].copy_from_slice(&sh_entsize.to_le_bytes());
    shdr
}

impl Elf32Builder {
    fn new() -> Self {
        // Section 0 is the mandatory NULL entry.
        Self {
            sections: vec![(shdr32(SHT_NULL, 0, 0, 0, 0), Vec::new())],
        }
    }

    fn section(
        mut self,
        sh_type: u32,
        sh_link: u32,
        sh_info: u32,
        sh_entsize: u32,
        data: Vec<u8>,
    ) -> Self {
        let shdr = shdr32(sh_type, data.len() as u32, sh_link, sh_info, sh_entsize);
        self.sections.push((shdr, data));
        self
    }

    fn build(self) -> Vec<u8> {
        let mut out = vec![0u8; EHDR32_SIZE];
        out[..4].copy_from_slice(ELF_MAGIC);
        out[EI_CLASS] = ELF_CLASS_32;
        out[EI_DATA] = ELF_DATA_LSB;
        out[EI_VERSION] = ELF_VERSION_CURRENT;
        out[EI_OSABI] = ELF_OSABI_SYSV;

        let mut shdrs = Vec::new();
        for (mut shdr, data) in self.sections {
            shdr[16..20].copy_from_slice(&(out.len() as u32).to_le_bytes());
            out.extend_from_slice(&data);
            shdrs.push(shdr);
        }

        let shoff = out.len() as u32;
        let shnum = shdrs.len() as u16;
        for shdr in shdrs {
            out.extend_from_slice(&shdr);
        }

        out[16..18].copy_from_slice(&ET_REL.to_le_bytes());
        out[18..20].copy_from_slice(&EM_386.to_le_bytes());
        out[20..24].copy_from_slice(&1u32.to_le_bytes());
        out[32..36].copy_from_slice(&shoff.to_le_bytes());
        out[40..42].copy_from_slice(&(EHDR32_SIZE as u16).to_le_bytes());
        out[46..48].copy_from_slice(&(SHDR32_SIZE as u16).to_le_bytes());
        out[48..50].copy_from_slice(&shnum.to_le_bytes());
        out
    }
}

fn sym32(st_name: u32, st_value: u32, st_info: u8, st_shndx: u16) -> Vec<u8> {
    let mut sym = vec![0u8; SYM32_SIZE];
    sym[..4].copy_from_slice(&st_name.to_le_bytes());
    sym[4..8].copy_from_slice(&st_value.to_le_bytes());
    sym[12] = st_info;
    sym[14..16].copy_from_slice(&st_shndx.to_le_bytes());
    sym
}

fn rel32(r_offset: u32, sym: u32, type32: u8) -> Vec<u8> {
    let mut rel = vec![0u8; REL32_SIZE];
    rel[..4].copy_from_slice(&r_offset.to_le_bytes());
    rel[4..8].copy_from_slice(&((sym << 8) | u32::from(type32)).to_le_bytes());
    rel
}

fn sample_object() -> Vec<u8> {
    // .text carries the in-place addend 0xFFFFFFFC (-4 as PC32) at offset 2.
    let mut text = vec![0x90u8; 8];
    text[2..6].copy_from_slice(&0xFFFF_FFFCu32.to_le_bytes());

    let mut symtab = sym32(0, 0, 0, 0);
    symtab.extend_from_slice(&sym32(1, 0, STB_GLOBAL << 4, SHN_UNDEF));

    Elf32Builder::new()
        .section(SHT_PROGBITS, 0, 0, 0, text) // 1: .text
        .section(SHT_SYMTAB, 3, 1, SYM32_SIZE as u32, symtab) // 2: .symtab
        .section(SHT_STRTAB, 0, 0, 0, b"\0f\0".to_vec()) // 3: .strtab
        .section(SHT_REL, 2, 1, REL32_SIZE as u32, rel32(2, 1, R_386_PC32)) // 4: .rel.text
        .build()
}

#[test]
fn test_lift_header() {
    let out = lift(&sample_object()).unwrap();
    let ehdr = Ehdr::parse(&out).unwrap();
    assert_eq!(ehdr.class(), ELF_CLASS_64);
    assert_eq!(ehdr.e_machine, EM_X86_64);
    assert_eq!(ehdr.e_type, ET_REL);
    assert_eq!(ehdr.e_ehsize as usize, EHDR64_SIZE);
    assert_eq!(ehdr.e_shentsize as usize, SHDR64_SIZE);
    assert_eq!(ehdr.e_shnum, 5);
    assert_eq!(ehdr.e_phnum, 0);
}

#[test]
fn test_lift_zeroes_inplace_addend_and_emits_rela() {
    let out = lift(&sample_object()).unwrap();
    let ehdr = Ehdr::parse(&out).unwrap();
    let shdrs = Shdr::parse_all(&out, &ehdr).unwrap();

    // .text content follows the 64-byte header, addend bytes zeroed.
    let text = &shdrs[1];
    assert_eq!(text.sh_offset as usize, EHDR64_SIZE);
    let off = text.sh_offset as usize;
    assert_eq!(&out[off..off + 2], &[0x90, 0x90]);
    assert_eq!(&out[off + 2..off + 6], &[0, 0, 0, 0]);

    // .rel.text became RELA with a widened entry.
    let rela = &shdrs[4];
    assert_eq!(rela.sh_type, SHT_RELA);
    assert_eq!(rela.sh_entsize as usize, RELA64_SIZE);
    assert_eq!(rela.sh_size as usize, RELA64_SIZE);

    let roff = rela.sh_offset as usize;
    let r_offset = u64::from_le_bytes(out[roff..roff + 8].try_into().unwrap());
    let r_info = u64::from_le_bytes(out[roff + 8..roff + 16].try_into().unwrap());
    let r_addend = i64::from_le_bytes(out[roff + 16..roff + 24].try_into().unwrap());
    assert_eq!(r_offset, 2);
    assert_eq!(r_info, (1u64 << 32) | u64::from(R_X86_64_PC32));
    assert_eq!(r_addend, -4);
}

#[test]
fn test_lift_widens_symtab() {
    let out = lift(&sample_object()).unwrap();
    let ehdr = Ehdr::parse(&out).unwrap();
    let shdrs = Shdr::parse_all(&out, &ehdr).unwrap();

    let symtab = &shdrs[2];
    assert_eq!(symtab.sh_entsize as usize, SYM64_SIZE);
    assert_eq!(symtab.sh_size as usize, 2 * SYM64_SIZE);

    let sym = Sym::parse(&out, symtab.sh_offset as usize + SYM64_SIZE, ELF_CLASS_64).unwrap();
    assert_eq!(sym.st_name, 1);
    assert_eq!(sym.binding(), STB_GLOBAL);
    assert_eq!(sym.st_shndx, SHN_UNDEF);
}

#[test]
fn test_lift_rejects_wrong_machine() {
    let mut obj = sample_object();
    obj[18..20].copy_from_slice(&EM_X86_64.to_le_bytes());
    assert!(matches!(
        lift(&obj),
        Err(ElfError::UnsupportedMachine(EM_X86_64))
    ));
}

#[test]
fn test_lift_rejects_reloc_before_target() {
    // Point the relocation at a section that comes after it.
    let text = vec![0u8; 4];
    let obj = Elf32Builder::new()
        .section(SHT_REL, 0, 2, REL32_SIZE as u32, rel32(0, 0, R_386_32)) // 1
        .section(SHT_PROGBITS, 0, 0, 0, text) // 2
        .build();
    assert!(matches!(
        lift(&obj),
        Err(ElfError::RelocationOrder { rel: 1, target: 2 })
    ));
}

#[test]
fn test_lift_rejects_unknown_relocation() {
    let text = vec![0u8; 4];
    let obj = Elf32Builder::new()
        .section(SHT_PROGBITS, 0, 0, 0, text) // 1
        .section(SHT_REL, 0, 1, REL32_SIZE as u32, rel32(0, 0, 99)) // 2
        .build();
    assert!(matches!(lift(&obj), Err(ElfError::UnsupportedRelocation(99))));
}
