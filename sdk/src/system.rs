//! The built-in system program surface the message layer depends on: the
//! advance-nonce instruction and its recognizer.

use crate::{
    address::Address,
    instruction::{AccountMeta, AccountRole, Instruction, InstructionAccount},
};

/// The system program owns the all-zero address.
pub const SYSTEM_PROGRAM_ADDRESS: Address = Address::new_from_array([0u8; 32]);

/// Sysvar holding the recent blockhash queue, read by advance-nonce.
pub const RECENT_BLOCKHASHES_SYSVAR_ADDRESS: Address = Address::new_from_array([
    6, 167, 213, 23, 25, 44, 86, 142, 224, 138, 132, 95, 115, 210, 151, 136, 207, 3, 92, 49, 69,
    178, 26, 179, 68, 216, 6, 46, 169, 64, 0, 0,
]);

/// Little-endian u32 instruction tag for advance-nonce.
pub const ADVANCE_NONCE_OPCODE: [u8; 4] = [4, 0, 0, 0];

/// Build the system-program instruction that advances a durable nonce
/// account, authorized by `nonce_authority`.
pub fn advance_nonce_account(nonce_account: &Address, nonce_authority: &Address) -> Instruction {
    Instruction::new(
        SYSTEM_PROGRAM_ADDRESS,
        vec![
            InstructionAccount::Static(AccountMeta::new(*nonce_account, AccountRole::Writable)),
            InstructionAccount::Static(AccountMeta::new(
                RECENT_BLOCKHASHES_SYSVAR_ADDRESS,
                AccountRole::Readonly,
            )),
            InstructionAccount::Static(AccountMeta::new(
                *nonce_authority,
                AccountRole::ReadonlySigner,
            )),
        ],
        ADVANCE_NONCE_OPCODE.to_vec(),
    )
}

/// The decompiler's durable-nonce test: the system program invoked with the
/// exact advance-nonce opcode on exactly three accounts in the fixed roles,
/// the second being the recent-blockhashes sysvar.
pub fn is_advance_nonce_instruction(instruction: &Instruction) -> bool {
    if instruction.program_address != SYSTEM_PROGRAM_ADDRESS
        || instruction.data() != ADVANCE_NONCE_OPCODE
    {
        return false;
    }
    let accounts = instruction.accounts();
    if accounts.len() != 3 {
        return false;
    }
    accounts[0].role() == AccountRole::Writable
        && accounts[1].address() == &RECENT_BLOCKHASHES_SYSVAR_ADDRESS
        && accounts[1].role() == AccountRole::Readonly
        && accounts[2].role() == AccountRole::ReadonlySigner
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_nonce_recognizes_itself() {
        let instruction =
            advance_nonce_account(&Address::new_unique(), &Address::new_unique());
        assert!(is_advance_nonce_instruction(&instruction));
    }

    #[test]
    fn test_recognizer_rejects_near_misses() {
        let nonce_account = Address::new_unique();
        let authority = Address::new_unique();
        let template = advance_nonce_account(&nonce_account, &authority);

        let mut wrong_program = template.clone();
        wrong_program.program_address = Address::new_unique();
        assert!(!is_advance_nonce_instruction(&wrong_program));

        let mut wrong_opcode = template.clone();
        wrong_opcode.data = Some(vec![5, 0, 0, 0]);
        assert!(!is_advance_nonce_instruction(&wrong_opcode));

        let mut missing_account = template.clone();
        missing_account
            .accounts
            .as_mut()
            .unwrap()
            .pop();
        assert!(!is_advance_nonce_instruction(&missing_account));

        let mut wrong_role = template;
        if let Some(InstructionAccount::Static(meta)) =
            wrong_role.accounts.as_mut().unwrap().first_mut()
        {
            meta.role = AccountRole::Readonly;
        }
        assert!(!is_advance_nonce_instruction(&wrong_role));
    }

    #[test]
    fn test_sysvar_address_renders_expected_base58() {
        assert_eq!(
            RECENT_BLOCKHASHES_SYSVAR_ADDRESS.to_string(),
            "SysvarRecentB1ockHashes11111111111111111111"
        );
    }
}
